use std::io::{BufWriter, Write};

/// A helper struct to write generated source to a buffer.
pub(crate) struct CodeWriter<T: Write> {
    pub(crate) buffer: BufWriter<T>,
}

impl<T: Write> CodeWriter<T> {
    /// Write a newline to the buffer.
    #[inline]
    pub(crate) fn newline(&mut self) -> Result<(), std::io::Error> {
        self.buffer.write_all(b"\n")
    }

    /// Write a string to the buffer, and optionally indent it.
    #[inline]
    pub(crate) fn write(
        &mut self,
        content: &str,
        indentation: Option<usize>,
    ) -> Result<(), std::io::Error> {
        self.buffer.write_fmt(format_args!(
            "{}{}",
            " ".repeat(indentation.unwrap_or(0)),
            content
        ))
    }

    /// Write a string to the buffer, and optionally indent it, followed by a
    /// newline.
    pub(crate) fn writeln(
        &mut self,
        content: &str,
        indentation: Option<usize>,
    ) -> Result<(), std::io::Error> {
        self.write(content, indentation)?;
        self.newline()
    }

    /// Write formatted content to the buffer, and optionally indent it,
    /// followed by a newline.
    pub(crate) fn writeln_fmt(
        &mut self,
        content: std::fmt::Arguments<'_>,
        indentation: Option<usize>,
    ) -> Result<(), std::io::Error> {
        if let Some(indentation) = indentation {
            self.buffer.write_all(" ".repeat(indentation).as_bytes())?;
        }
        self.buffer.write_fmt(content)?;
        self.newline()
    }

    /// Write doc comment lines, optionally indented.
    pub(crate) fn write_documentation(
        &mut self,
        documentations: &[String],
        indentation: Option<usize>,
    ) -> Result<(), std::io::Error> {
        for documentation in documentations {
            for line in documentation.split('\n') {
                self.writeln_fmt(format_args!("/// {}", line.trim_end()), indentation)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
impl<T: Write> CodeWriter<T> {
    pub(crate) fn get_writer(&mut self) -> Result<&T, std::io::Error> {
        self.buffer.flush()?;

        Ok(self.buffer.get_ref())
    }
}
