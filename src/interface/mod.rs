pub mod runtime;

pub use runtime::ScriptRuntime;
