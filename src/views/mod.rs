//! Client views as plain state machines over the record API. Each view owns
//! its state; a page shell renders what they expose and forwards user input.

pub mod form;
pub mod map;
pub mod popup;

/// Where a view asks the shell to go next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    /// The listing (map) page
    Listing,
}

