//! Database query operations organized by table

pub mod audiobooks;
pub mod collections;
pub mod datasources;

pub use audiobooks::{
    count_audiobooks, create_audiobook, delete_audiobook, find_by_location, get_audiobook,
    list_audiobooks, list_by_collection, list_by_datasource, list_locations, update_audiobook,
    update_collections, update_position, update_speed,
};
pub use collections::{
    create_collection, delete_collection, find_collection_by_name, get_collection,
    list_collections,
};
pub use datasources::{create_datasource, delete_datasource, get_datasource, list_datasources};
