mod memory;
mod models;
mod postgres;
mod store;

pub use self::{
    memory::MemoryStore,
    models::{NewPost, Post, PostStatus},
    postgres::{DBPool, connect, migrate},
    store::{PgStore, Store},
};
