pub mod roster;
pub mod sheet;

pub use roster::{load_roster, Roster, RosterStudent};
pub use sheet::{DocumentResult, ScoreObservation, SheetData, StudentRecord};
