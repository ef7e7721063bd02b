use chrono::NaiveDate;
use rusqlite::Connection;
use serde_json::json;
use staffdesk_core::db::open_db_in_memory;
use staffdesk_core::{
    NewDepartment, NewEmployee, QueryError, QueryEvaluator, Repository,
    SqliteDepartmentRepository, SqliteEmployeeRepository,
};

fn evaluator() -> QueryEvaluator {
    QueryEvaluator::with_today(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())
}

fn populated() -> Connection {
    let conn = open_db_in_memory().unwrap();
    let departments = SqliteDepartmentRepository::new(&conn);
    let it = departments
        .create(&NewDepartment {
            name: "IT".to_string(),
            location: "Berlin".to_string(),
            budget: 100_000.0,
        })
        .unwrap();
    let hr = departments
        .create(&NewDepartment {
            name: "HR".to_string(),
            location: "HQ".to_string(),
            budget: 50_000.0,
        })
        .unwrap();

    let employees = SqliteEmployeeRepository::new(&conn);
    for (name, age, dep_id, hired, active) in [
        ("Alice", 30, it.id, (2024, 2, 20), true),
        ("Bruno", 45, it.id, (2020, 5, 1), true),
        ("Chiara", 28, hr.id, (2023, 11, 9), false),
    ] {
        let mut input = NewEmployee::new(name, dep_id);
        input.age = Some(age);
        input.salary = f64::from(age) * 1_000.0;
        input.hire_date = NaiveDate::from_ymd_opt(hired.0, hired.1, hired.2);
        input.active = active;
        employees.create(&input).unwrap();
    }
    conn
}

#[test]
fn filters_project_and_order_rows() {
    let conn = populated();
    let rows = evaluator()
        .evaluate(
            &conn,
            "employees where active = true select name, age order by age desc",
        )
        .unwrap();

    let rows: Vec<serde_json::Value> = rows.into_iter().map(serde_json::Value::Object).collect();
    assert_eq!(
        rows,
        vec![
            json!({"name": "Bruno", "age": 45}),
            json!({"name": "Alice", "age": 30}),
        ]
    );
}

#[test]
fn full_rows_render_dates_as_iso_text_and_flags_as_bools() {
    let conn = populated();
    let rows = evaluator()
        .evaluate(&conn, "employees where name = 'Chiara'")
        .unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["hire_date"], json!("2023-11-09"));
    assert_eq!(rows[0]["active"], json!(false));
    assert_eq!(rows[0]["gender"], json!("other"));
    assert_eq!(rows[0]["manager_id"], json!(null));
}

#[test]
fn single_aggregate_yields_value_record() {
    let conn = populated();
    let rows = evaluator()
        .evaluate(&conn, "departments select sum(budget)")
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["value"], json!("150000"));

    let rows = evaluator().evaluate(&conn, "roles select count(*)").unwrap();
    assert_eq!(rows[0]["value"], json!("0"));
}

#[test]
fn grouped_aggregates_are_tabular() {
    let conn = populated();
    let rows = evaluator()
        .evaluate(
            &conn,
            "employees select dep_id, count(*) group by dep_id order by dep_id",
        )
        .unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["count(*)"], json!(2));
    assert_eq!(rows[1]["count(*)"], json!(1));
}

#[test]
fn date_helpers_compare_against_pinned_today() {
    let conn = populated();
    let rows = evaluator()
        .evaluate(&conn, "employees where hire_date >= days_ago(30) select name")
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["name"], json!("Alice"));
}

#[test]
fn injection_text_is_treated_as_a_literal() {
    let conn = populated();
    let rows = evaluator()
        .evaluate(&conn, "employees where name = 'x'' OR 1=1 --'")
        .unwrap();
    assert!(rows.is_empty());

    let err = evaluator()
        .evaluate(&conn, "employees; DROP TABLE employees")
        .unwrap_err();
    assert!(matches!(err, QueryError::Syntax(_) | QueryError::UnknownEntity(_)));
    assert_eq!(
        evaluator().evaluate(&conn, "employees").unwrap().len(),
        3
    );
}

#[test]
fn batch_isolates_failures_and_keeps_order() {
    let conn = populated();
    let outcomes = evaluator().run_batch(
        &conn,
        "departments select count(*)\nsalaries\n\n   \nemployees where wage > 1\nroles\n",
    );

    let queries: Vec<&str> = outcomes.iter().map(|o| o.query.as_str()).collect();
    assert_eq!(
        queries,
        vec![
            "departments select count(*)",
            "salaries",
            "employees where wage > 1",
            "roles"
        ]
    );

    assert!(!outcomes[0].is_error());
    assert_eq!(
        outcomes[0].result.as_ref().unwrap()[0]["value"],
        json!("2")
    );
    assert!(outcomes[1].is_error());
    assert!(outcomes[1].result.is_none());
    assert!(outcomes[1].error.as_ref().unwrap().contains("salaries"));
    assert!(outcomes[2].is_error());
    assert!(outcomes[2].error.as_ref().unwrap().contains("wage"));
    assert!(!outcomes[3].is_error());
    assert_eq!(outcomes[3].result.as_ref().unwrap().len(), 0);
}

#[test]
fn empty_batch_produces_no_outcomes() {
    let conn = populated();
    assert!(evaluator().run_batch(&conn, "  \n\n").is_empty());
}

#[test]
fn oversized_filters_fail_their_line_only() {
    let worker = std::thread::Builder::new()
        .stack_size(2 * 1024 * 1024)
        .spawn(|| {
            let conn = populated();
            let nested = format!("employees where {}id = 1", "not ".repeat(10_000));
            let chained = format!("employees where id = 1{}", " or id = 1".repeat(100_000));
            let input = format!("{nested}\n{chained}\nroles");
            evaluator().run_batch(&conn, &input)
        })
        .unwrap();
    let outcomes = worker.join().unwrap();

    assert_eq!(outcomes.len(), 3);
    assert!(outcomes[0].is_error());
    assert!(outcomes[0].error.as_ref().unwrap().contains("deeper"));
    assert!(outcomes[1].is_error());
    assert!(outcomes[1].error.as_ref().unwrap().contains("conditions"));
    assert!(!outcomes[2].is_error());
}
