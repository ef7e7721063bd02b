use rand::rngs::StdRng;
use rand::SeedableRng;
use rusqlite::Connection;
use staffdesk_core::db::open_db_in_memory;
use staffdesk_core::{
    seed_demo_data, NewDepartment, Repository, SeedError, SeedRequest,
    SqliteDepartmentRepository, SqliteEmployeeRepository,
};
use std::collections::HashSet;

fn count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
    .unwrap()
}

#[test]
fn seeding_creates_requested_counts_with_valid_references() {
    let mut conn = open_db_in_memory().unwrap();
    let mut rng = StdRng::seed_from_u64(7);
    let request = SeedRequest {
        n_departments: 3,
        n_employees: 10,
    };

    let summary = seed_demo_data(&mut conn, &request, &mut rng).unwrap();
    assert_eq!(summary.departments, 3);
    assert_eq!(summary.employees, 10);
    assert_eq!(count(&conn, "departments"), 3);
    assert_eq!(count(&conn, "employees"), 10);

    let department_ids: HashSet<i64> = SqliteDepartmentRepository::new(&conn)
        .get_all()
        .unwrap()
        .into_iter()
        .map(|department| department.id)
        .collect();
    let employees = SqliteEmployeeRepository::new(&conn).get_all().unwrap();
    let employee_ids: HashSet<i64> = employees.iter().map(|employee| employee.id).collect();
    for employee in &employees {
        assert!(department_ids.contains(&employee.dep_id));
        assert!(employee.department.is_some());
        if let Some(manager_id) = employee.manager_id {
            assert!(employee_ids.contains(&manager_id));
            assert!(manager_id < employee.id);
        }
    }
}

#[test]
fn seeding_replaces_existing_rows() {
    let mut conn = open_db_in_memory().unwrap();
    SqliteDepartmentRepository::new(&conn)
        .create(&NewDepartment::new("Legacy"))
        .unwrap();

    let mut rng = StdRng::seed_from_u64(1);
    seed_demo_data(&mut conn, &SeedRequest::default(), &mut rng).unwrap();
    let mut rng = StdRng::seed_from_u64(2);
    seed_demo_data(
        &mut conn,
        &SeedRequest {
            n_departments: 2,
            n_employees: 4,
        },
        &mut rng,
    )
    .unwrap();

    assert_eq!(count(&conn, "departments"), 2);
    assert_eq!(count(&conn, "employees"), 4);
    let legacy: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM departments WHERE name = 'Legacy';",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(legacy, 0);
}

#[test]
fn departments_beyond_name_list_get_numbered_names() {
    let mut conn = open_db_in_memory().unwrap();
    let mut rng = StdRng::seed_from_u64(3);
    seed_demo_data(
        &mut conn,
        &SeedRequest {
            n_departments: 9,
            n_employees: 0,
        },
        &mut rng,
    )
    .unwrap();

    let names: Vec<String> = SqliteDepartmentRepository::new(&conn)
        .get_all()
        .unwrap()
        .into_iter()
        .map(|department| department.name)
        .collect();
    assert_eq!(names.len(), 9);
    assert_eq!(names[0], "HR");
    assert_eq!(names[8], "Department 9");
    assert_eq!(count(&conn, "employees"), 0);
}

#[test]
fn employees_without_departments_is_rejected_and_keeps_data() {
    let mut conn = open_db_in_memory().unwrap();
    SqliteDepartmentRepository::new(&conn)
        .create(&NewDepartment::new("Keep"))
        .unwrap();
    let mut rng = StdRng::seed_from_u64(4);

    let err = seed_demo_data(
        &mut conn,
        &SeedRequest {
            n_departments: 0,
            n_employees: 5,
        },
        &mut rng,
    )
    .unwrap_err();
    assert!(matches!(err, SeedError::NoDepartments { n_employees: 5 }));
    assert_eq!(count(&conn, "departments"), 1);
}

#[test]
fn zero_request_clears_everything() {
    let mut conn = open_db_in_memory().unwrap();
    let mut rng = StdRng::seed_from_u64(5);
    seed_demo_data(&mut conn, &SeedRequest::default(), &mut rng).unwrap();

    seed_demo_data(
        &mut conn,
        &SeedRequest {
            n_departments: 0,
            n_employees: 0,
        },
        &mut rng,
    )
    .unwrap();
    assert_eq!(count(&conn, "departments"), 0);
    assert_eq!(count(&conn, "employees"), 0);
    assert_eq!(count(&conn, "employee_project"), 0);
}
