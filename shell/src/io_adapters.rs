use std::cell::RefCell;
use std::io::{Result as IoResult, Write};
use std::rc::Rc;

/// In-memory diagnostic sink.
///
/// Clones share the same buffer, so one clone can be handed to an
/// [`Interpreter`](crate::Interpreter) while another reads what was written.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer {
    buf: Rc<RefCell<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, decoded lossily.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buf.borrow()).into_owned()
    }

    pub fn clear(&self) {
        self.buf.borrow_mut().clear();
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, data: &[u8]) -> IoResult<usize> {
        self.buf.borrow_mut().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> IoResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_contents() {
        let reader = SharedBuffer::new();
        let mut writer = reader.clone();

        writeln!(writer, "hello").unwrap();
        write!(writer, "world").unwrap();
        assert_eq!(reader.contents(), "hello\nworld");

        reader.clear();
        assert_eq!(writer.contents(), "");
    }
}
