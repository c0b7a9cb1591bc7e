mod seed_tests;

pub(crate) use memory_store::{MemoryStore, RecordingSink};
