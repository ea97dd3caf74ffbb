//! Shared fixtures for integration tests
//!
//! One project with two components:
//!
//! ```text
//! component:1 "Bauteil A"
//!   riser:10
//!     floor:100  unit:1000 (tasks from 2024-01-10), unit:1001
//!     floor:101  unit:1010 (persisted start 2025-06-01)
//! component:2 "Bauteil B" (process model 5)
//!   riser:20
//!     floor:200  unit:2000 (tasks from 2024-03-01)
//! ```

use chrono::NaiveDate;
use structsync::backend::wire::{FloorRecord, RiserRecord, UnitRecord};
use structsync::backend::{ComponentRecord, MockBackend, ProcessModelRecord, TimelineTask};
use structsync::session::EditSession;
use structsync::types::ProjectId;

pub const PROJECT: ProjectId = 42;

pub fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn unit(id: u64, name: &str, start: Option<NaiveDate>) -> UnitRecord {
    UnitRecord {
        id,
        name: name.to_string(),
        process_model_id: None,
        start_soll: start,
    }
}

fn floor(id: u64, name: &str, units: Vec<UnitRecord>) -> FloorRecord {
    FloorRecord {
        id,
        name: name.to_string(),
        process_model_id: None,
        start_soll: None,
        units,
    }
}

pub fn structure() -> Vec<ComponentRecord> {
    vec![
        ComponentRecord {
            id: 1,
            name: "Bauteil A".into(),
            process_model_id: None,
            start_soll: None,
            risers: vec![RiserRecord {
                id: 10,
                name: "Stiege 1".into(),
                process_model_id: None,
                start_soll: None,
                floors: vec![
                    floor(
                        100,
                        "EG",
                        vec![unit(1000, "Top 1", None), unit(1001, "Top 2", None)],
                    ),
                    floor(101, "OG1", vec![unit(1010, "Top 3", Some(d("2025-06-01")))]),
                ],
            }],
        },
        ComponentRecord {
            id: 2,
            name: "Bauteil B".into(),
            process_model_id: Some(5),
            start_soll: None,
            risers: vec![RiserRecord {
                id: 20,
                name: "Stiege 1".into(),
                process_model_id: None,
                start_soll: None,
                floors: vec![floor(200, "EG", vec![unit(2000, "Top 1", None)])],
            }],
        },
    ]
}

pub fn tasks() -> Vec<TimelineTask> {
    vec![
        TimelineTask::new(1000, Some(d("2024-01-20")), Some("Rohbau")),
        TimelineTask::new(1000, Some(d("2024-01-10")), Some("Rohbau")),
        TimelineTask::new(2000, Some(d("2024-03-01")), Some("Rohbau")),
    ]
}

pub fn process_models() -> Vec<ProcessModelRecord> {
    vec![
        ProcessModelRecord {
            id: 5,
            name: "Rohbau".into(),
        },
        ProcessModelRecord {
            id: 6,
            name: "Ausbau".into(),
        },
    ]
}

pub fn mock_backend() -> MockBackend {
    MockBackend::new(structure(), tasks(), process_models())
}

pub async fn open(backend: &MockBackend) -> EditSession {
    EditSession::open(backend, PROJECT).await.unwrap()
}
