pub mod leaderboard;
pub mod policy;
pub mod submission_wizard;
