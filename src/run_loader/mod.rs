mod loader;
mod serialized_run;

pub use loader::load_run;
