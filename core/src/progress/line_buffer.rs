/// 按 `\n` 切分字节流，保留跨 chunk 的半行
#[derive(Debug, Default)]
pub struct LineBuffer {
    buf: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and return every line it completes, without terminators.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);
        let mut lines = Vec::new();
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let mut one: Vec<u8> = self.buf.drain(..=pos).collect();
            trim_newline(&mut one);
            lines.push(String::from_utf8_lossy(&one).into_owned());
        }
        lines
    }

    /// EOF flush: the last partial line, if any.
    pub fn finish(&mut self) -> Option<String> {
        let mut rest = std::mem::take(&mut self.buf);
        trim_newline(&mut rest);
        if rest.is_empty() {
            None
        } else {
            Some(String::from_utf8_lossy(&rest).into_owned())
        }
    }
}

fn trim_newline(buf: &mut Vec<u8>) {
    if buf.last() == Some(&b'\n') {
        buf.pop();
    }
    if buf.last() == Some(&b'\r') {
        buf.pop();
    }
}
