pub mod in_memory_store;
