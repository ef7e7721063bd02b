//! Hand-written HTML for the operator console.
//!
//! # Invariants
//! - All interpolated text passes through `escape_html`.

use staffdesk_core::{Department, Employee, QueryOutcome, StoredQuery};
use std::fmt::Write;

const STYLE: &str = "body{font-family:sans-serif;margin:2rem;}\
table{border-collapse:collapse;margin-bottom:1.5rem;}\
td,th{border:1px solid #ccc;padding:.25rem .5rem;text-align:left;}\
pre{background:#f6f6f6;padding:.5rem;overflow-x:auto;}\
.error{color:#b00020;}\
textarea{width:100%;font-family:monospace;}";

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Full console page: seed form, query runner, saved queries, results and
/// entity tables.
pub fn render_index(
    departments: &[Department],
    employees: &[Employee],
    results: &[QueryOutcome],
    stored_queries: &[StoredQuery],
) -> String {
    let mut body = String::new();

    body.push_str(
        "<h2>Seed data</h2>\n\
         <form method=\"post\" action=\"/seed-data\">\n\
         <label>Departments <input type=\"number\" name=\"n_departments\" value=\"5\" min=\"0\"></label>\n\
         <label>Employees <input type=\"number\" name=\"n_employees\" value=\"50\" min=\"0\"></label>\n\
         <button type=\"submit\">Seed</button>\n</form>\n",
    );

    body.push_str(
        "<h2>Run queries</h2>\n\
         <form method=\"post\" action=\"/run-query\">\n\
         <textarea name=\"query\" rows=\"5\" placeholder=\"employees where active = true limit 10\"></textarea>\n\
         <button type=\"submit\">Run</button>\n</form>\n\
         <form method=\"post\" action=\"/add-query\">\n\
         <textarea name=\"query\" rows=\"2\" placeholder=\"query to save\"></textarea>\n\
         <button type=\"submit\">Save query</button>\n</form>\n",
    );

    push_stored_queries(&mut body, stored_queries);
    push_results(&mut body, results);
    push_departments(&mut body, departments);
    push_employees(&mut body, employees);

    page("StaffDesk", &body)
}

/// Minimal page carrying one status message and a link back to the console.
pub fn render_status(title: &str, message: &str) -> String {
    let body = format!(
        "<p>{}</p>\n<p><a href=\"/\">Back to console</a></p>\n",
        escape_html(message)
    );
    page(title, &body)
}

fn page(title: &str, body: &str) -> String {
    let title = escape_html(title);
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n\
         <style>{STYLE}</style>\n</head>\n<body>\n<h1>{title}</h1>\n{body}</body>\n</html>\n"
    )
}

fn push_stored_queries(body: &mut String, stored_queries: &[StoredQuery]) {
    body.push_str("<h2>Saved queries</h2>\n");
    if stored_queries.is_empty() {
        body.push_str("<p>No saved queries.</p>\n");
    } else {
        body.push_str("<form method=\"post\" action=\"/update-queries\">\n<table>\n");
        for stored in stored_queries {
            let _ = writeln!(
                body,
                "<tr><td>{id}</td><td><textarea name=\"query_{id}\" rows=\"1\">{query}</textarea></td>\
                 <td><button type=\"submit\" formaction=\"/delete-query/{id}\">Delete</button></td></tr>",
                id = stored.id,
                query = escape_html(&stored.query)
            );
        }
        body.push_str("</table>\n<button type=\"submit\">Update queries</button>\n</form>\n");
    }
    body.push_str("<p><a href=\"/download-results\">Download saved queries</a></p>\n");
}

fn push_results(body: &mut String, results: &[QueryOutcome]) {
    body.push_str("<h2>Results</h2>\n");
    if results.is_empty() {
        body.push_str("<p>No results yet.</p>\n");
        return;
    }
    body.push_str(
        "<form method=\"post\" action=\"/clear-results\">\
         <button type=\"submit\">Clear results</button></form>\n",
    );
    for outcome in results {
        let _ = writeln!(body, "<h3><code>{}</code></h3>", escape_html(&outcome.query));
        match (&outcome.error, &outcome.result) {
            (Some(error), _) => {
                let _ = writeln!(body, "<p class=\"error\">{}</p>", escape_html(error));
            }
            (None, Some(rows)) => {
                let rendered = serde_json::to_string_pretty(rows)
                    .unwrap_or_else(|err| format!("<unrenderable result: {err}>"));
                let _ = writeln!(
                    body,
                    "<p>{} row(s)</p>\n<pre>{}</pre>",
                    rows.len(),
                    escape_html(&rendered)
                );
            }
            (None, None) => body.push_str("<p>No result.</p>\n"),
        }
    }
}

fn push_departments(body: &mut String, departments: &[Department]) {
    body.push_str(
        "<h2>Departments</h2>\n<table>\n\
         <tr><th>ID</th><th>Name</th><th>Location</th><th>Budget</th></tr>\n",
    );
    for department in departments {
        let _ = writeln!(
            body,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{:.2}</td></tr>",
            department.id,
            escape_html(&department.name),
            escape_html(&department.location),
            department.budget
        );
    }
    body.push_str("</table>\n");
}

fn push_employees(body: &mut String, employees: &[Employee]) {
    body.push_str(
        "<h2>Employees</h2>\n<table>\n\
         <tr><th>ID</th><th>Name</th><th>Age</th><th>Email</th><th>Department</th>\
         <th>Salary</th><th>Hired</th><th>Active</th></tr>\n",
    );
    for employee in employees {
        let department = employee
            .department
            .as_ref()
            .map(|department| department.name.as_str())
            .unwrap_or("");
        let _ = writeln!(
            body,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{:.2}</td><td>{}</td><td>{}</td></tr>",
            employee.id,
            escape_html(&employee.name),
            employee.age.map(|age| age.to_string()).unwrap_or_default(),
            escape_html(employee.email.as_deref().unwrap_or("")),
            escape_html(department),
            employee.salary,
            employee.hire_date,
            if employee.active { "yes" } else { "no" }
        );
    }
    body.push_str("</table>\n");
}

#[cfg(test)]
mod tests {
    use super::{escape_html, render_index, render_status};
    use staffdesk_core::{Department, QueryOutcome, StoredQuery};

    #[test]
    fn escape_html_neutralizes_markup() {
        assert_eq!(
            escape_html("<script>alert('x') & \"y\"</script>"),
            "&lt;script&gt;alert(&#39;x&#39;) &amp; &quot;y&quot;&lt;/script&gt;"
        );
    }

    #[test]
    fn index_escapes_every_interpolated_value() {
        let departments = vec![Department {
            id: 1,
            name: "<b>R&D</b>".to_string(),
            location: "HQ".to_string(),
            budget: 10.0,
        }];
        let results = vec![QueryOutcome::failure("roles <x>", "unknown field `<y>`")];
        let stored = vec![StoredQuery {
            id: 4,
            query: "</textarea><script>".to_string(),
        }];

        let html = render_index(&departments, &[], &results, &stored);
        assert!(html.contains("&lt;b&gt;R&amp;D&lt;/b&gt;"));
        assert!(html.contains("roles &lt;x&gt;"));
        assert!(html.contains("&lt;/textarea&gt;&lt;script&gt;"));
        assert!(html.contains("name=\"query_4\""));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn status_page_carries_message() {
        let html = render_status("Seed complete", "Seeded 3 Departments & 10 Employees");
        assert!(html.contains("<title>Seed complete</title>"));
        assert!(html.contains("Seeded 3 Departments &amp; 10 Employees"));
    }
}
