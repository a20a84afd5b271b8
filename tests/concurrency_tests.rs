use std::collections::HashSet;
use std::sync::Arc;

use tabstore::{Database, DbError};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_parallel_inserts_on_different_tables() {
    let db = Arc::new(Database::in_memory());
    for t in 0..4 {
        db.execute(&format!("CREATE TABLE t{} (v) PRIMARY KEY (id)", t))
            .await
            .unwrap();
    }

    let mut handles = Vec::new();
    for t in 0..4 {
        let db = db.clone();
        handles.push(tokio::spawn(async move {
            for i in 0..50 {
                db.execute(&format!("INSERT INTO t{} VALUES (v{})", t, i))
                    .await
                    .unwrap();
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    for t in 0..4 {
        let all = db.execute(&format!("SELECT * FROM t{}", t)).await.unwrap();
        assert_eq!(all.row_count(), 50);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_inserts_on_one_table_get_unique_keys() {
    let db = Arc::new(Database::in_memory());
    db.execute("CREATE TABLE shared (writer) PRIMARY KEY (id)")
        .await
        .unwrap();

    let mut handles = Vec::new();
    for w in 0..8 {
        let db = db.clone();
        handles.push(tokio::spawn(async move {
            for _ in 0..25 {
                db.execute(&format!("INSERT INTO shared VALUES (w{})", w))
                    .await
                    .unwrap();
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let all = db.execute("SELECT * FROM shared").await.unwrap();
    assert_eq!(all.row_count(), 200);
    let keys: HashSet<&str> = all.rows().iter().map(|row| row[0].as_str()).collect();
    assert_eq!(keys.len(), 200);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_racing_creates_register_exactly_once() {
    let db = Arc::new(Database::in_memory());

    let mut handles = Vec::new();
    for i in 0..16 {
        let db = db.clone();
        handles.push(tokio::spawn(async move {
            db.execute(&format!("CREATE TABLE contested (c{}) PRIMARY KEY (id)", i))
                .await
        }));
    }

    let mut created = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => created += 1,
            Err(DbError::TableExists(name)) => assert_eq!(name, "contested"),
            Err(e) => panic!("unexpected error: {}", e),
        }
    }
    assert_eq!(created, 1);
    assert_eq!(db.list_tables().unwrap(), vec!["contested"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_reads_alongside_deletes_see_whole_operations() {
    let db = Arc::new(Database::in_memory());
    db.execute("CREATE TABLE t (v) PRIMARY KEY (id)").await.unwrap();
    for i in 0..100 {
        db.execute(&format!("INSERT INTO t VALUES ({})", i % 2))
            .await
            .unwrap();
    }

    let writer = {
        let db = db.clone();
        tokio::spawn(async move { db.execute("DELETE FROM t WHERE v = 1").await })
    };
    let reader = {
        let db = db.clone();
        tokio::spawn(async move { db.execute("SELECT * FROM t").await })
    };

    assert_eq!(writer.await.unwrap().unwrap().affected_rows(), Some(50));
    let seen = reader.await.unwrap().unwrap();
    assert!(seen.row_count() == 100 || seen.row_count() == 50);
    for (idx, row) in seen.rows().iter().enumerate() {
        assert_eq!(row[0], idx.to_string());
    }
}
