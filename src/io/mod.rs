/// CSV export of derived views.
pub mod export;
