//! Three-address-code emission (C7).
//!
//! Grounded in `examples/original_source/src/compiler_generator/code_generator.py`'s
//! `new_temp`/`new_label`/`emit`/`reset`, adapted to the exact instruction
//! shapes named in the translation scheme rather than a generic
//! `result = arg1 op arg2` text.

/// Owns the monotonic temp/label counters and the instruction buffer for a
/// single `compile(source)` call. Discarded when that call returns.
#[derive(Debug, Default)]
pub struct TacEmitter {
    temp_counter: usize,
    label_counter: usize,
    lines: Vec<String>,
}

impl TacEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_temp(&mut self) -> String {
        self.temp_counter += 1;
        format!("t{}", self.temp_counter)
    }

    pub fn new_label(&mut self) -> String {
        self.label_counter += 1;
        format!("L{}", self.label_counter)
    }

    pub fn emit(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    /// One instruction per line, trailing newline, no blank lines.
    pub fn output(&self) -> String {
        let mut s = self.lines.join("\n");
        if !self.lines.is_empty() {
            s.push('\n');
        }
        s
    }

    pub fn reset(&mut self) {
        self.temp_counter = 0;
        self.label_counter = 0;
        self.lines.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temps_and_labels_are_monotonic() {
        let mut e = TacEmitter::new();
        assert_eq!(e.new_temp(), "t1");
        assert_eq!(e.new_temp(), "t2");
        assert_eq!(e.new_label(), "L1");
        assert_eq!(e.new_temp(), "t3");
    }

    #[test]
    fn output_has_no_blank_lines_and_trailing_newline() {
        let mut e = TacEmitter::new();
        e.emit("x = 1");
        e.emit("y = 2");
        assert_eq!(e.output(), "x = 1\ny = 2\n");
    }

    #[test]
    fn empty_emitter_produces_empty_output() {
        let e = TacEmitter::new();
        assert_eq!(e.output(), "");
    }

    #[test]
    fn reset_clears_counters_and_buffer() {
        let mut e = TacEmitter::new();
        e.new_temp();
        e.emit("x = 1");
        e.reset();
        assert_eq!(e.new_temp(), "t1");
        assert_eq!(e.output(), "");
    }
}
