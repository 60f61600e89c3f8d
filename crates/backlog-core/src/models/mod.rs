pub mod item;
pub mod patch;

pub use item::{
    status_choices_message, CreateItemRequest, Item, ItemChanges, ItemStatus, NewItem,
    UpdateItemRequest, ALLOWED_STATUSES,
};
pub use patch::Patch;
