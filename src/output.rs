use std::sync::{Arc, Mutex};

/// Line-oriented sink for program output.
pub trait Output: Send + Sync {
    fn emit(&self, line: &str);
}

pub type SharedOutput = Arc<dyn Output>;

#[derive(Debug, Default, Clone, Copy)]
pub struct Stdout;

impl Output for Stdout {
    fn emit(&self, line: &str) {
        println!("{line}");
    }
}

/// Keeps every emitted line, in order.
#[derive(Debug, Default, Clone)]
pub struct MemoryOutput {
    lines: Arc<Mutex<Vec<String>>>,
}

impl MemoryOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }
}

impl Output for MemoryOutput {
    fn emit(&self, line: &str) {
        self.lines.lock().unwrap().push(line.to_owned());
    }
}

#[test]
fn test_memory_output_clones_share_lines() {
    let out = MemoryOutput::new();
    let other = out.clone();
    out.emit("a");
    other.emit("b");
    assert_eq!(out.lines(), ["a", "b"]);
}
