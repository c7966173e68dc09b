use std::collections::VecDeque;
use std::sync::Mutex;

/// 固定容量的字节尾部缓冲，保留最近写入的 `cap` 字节
pub struct RingBytes {
    inner: Mutex<VecDeque<u8>>,
    cap: usize,
}

impl RingBytes {
    pub fn new(cap: usize) -> Self {
        Self {
            inner: Mutex::new(VecDeque::with_capacity(cap.min(64 * 1024))),
            cap,
        }
    }

    pub fn push(&self, data: &[u8]) {
        if self.cap == 0 {
            return;
        }
        let mut g = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let data = if data.len() > self.cap {
            &data[data.len() - self.cap..]
        } else {
            data
        };
        let overflow = g.len().saturating_add(data.len()).saturating_sub(self.cap);
        if overflow > 0 {
            g.drain(..overflow);
        }
        g.extend(data);
    }

    pub fn push_line(&self, line: &str) {
        self.push(line.as_bytes());
        self.push(b"\n");
    }

    pub fn to_string_lossy(&self) -> String {
        let g = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let (a, b) = g.as_slices();
        let mut vec = Vec::with_capacity(g.len());
        vec.extend_from_slice(a);
        vec.extend_from_slice(b);
        String::from_utf8_lossy(&vec).into_owned()
    }
}
