use crate::model::{
    Assignment, AttendanceRecord, Batch, Course, Expense, FeePayment, Lead, Staff, Student,
};
use crate::store::ListStore;
use crate::table::SortConfig;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// In-memory mirror of the backing lists, replaced wholesale on every
/// refetch. Only the owning handlers assign into it; nothing patches a
/// collection in place from outside.
#[derive(Default)]
pub struct Mirror {
    pub students: Vec<Student>,
    pub staff: Vec<Staff>,
    pub courses: Vec<Course>,
    pub batches: Vec<Batch>,
    pub fees: Vec<FeePayment>,
    pub expenses: Vec<Expense>,
    pub assignments: Vec<Assignment>,
    pub leads: Vec<Lead>,
    pub attendance: Vec<AttendanceRecord>,
    /// Last applied sort per table, for toggle semantics.
    pub sorts: HashMap<String, SortConfig>,
}

pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub store: Option<ListStore>,
    pub data: Mirror,
}
