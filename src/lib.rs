#![deny(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]

pub mod backend;
pub mod cli;
pub mod config;
pub mod error;
pub mod listing;
pub mod record;

mod facade;
mod format;
mod logger;

pub use self::{
    config::Config,
    error::{Error, Result},
    facade::StorageFacade,
    listing::{drain, ListingStats, ObjectStream, StreamItem},
    record::ObjectRecord,
};
