//! Test-only builder writing datagrams at a layout's offsets.

use super::layout::{LayoutVersion, MAGIC, OBJECT_NAME_LEN, VERSION_STRING_LEN};
use super::packet::NODE_KEY_LEN;

pub(crate) struct PacketBuilder {
    layout: LayoutVersion,
    buf: Vec<u8>,
    ranges: Vec<(u32, u32)>,
    objects: Vec<(String, u64)>,
}

impl PacketBuilder {
    pub(crate) fn new(layout: LayoutVersion) -> Self {
        let t = layout.offsets();
        let mut builder = Self {
            layout,
            buf: vec![0; t.header_len],
            ranges: Vec::new(),
            objects: Vec::new(),
        };
        if let Some(off) = t.magic {
            builder.put(off, &MAGIC.to_le_bytes());
        }
        let version = match layout {
            LayoutVersion::Current => 3,
            LayoutVersion::Compact => 2,
            LayoutVersion::Legacy => 1,
        };
        let mut key = [0xAB; NODE_KEY_LEN];
        key[0] = 0x02;
        builder.version(version).cpu_cores(4).node_key(key)
    }

    fn put(&mut self, off: usize, bytes: &[u8]) {
        self.buf[off..off + bytes.len()].copy_from_slice(bytes);
    }

    fn put_u64(&mut self, off: usize, value: u64) {
        self.put(off, &(value as u32).to_le_bytes());
        self.put(off + 4, &((value >> 32) as u32).to_le_bytes());
    }

    pub(crate) fn version(mut self, v: u32) -> Self {
        let off = self.layout.offsets().version;
        self.put(off, &v.to_le_bytes());
        self
    }

    pub(crate) fn server_state(mut self, state: u32) -> Self {
        let off = self.layout.offsets().server_state;
        self.put(off, &state.to_le_bytes());
        self
    }

    pub(crate) fn peer_count(mut self, n: u32) -> Self {
        let off = self.layout.offsets().peer_count;
        self.put(off, &n.to_le_bytes());
        self
    }

    pub(crate) fn cpu_cores(mut self, n: u32) -> Self {
        let off = self.layout.offsets().cpu_cores;
        self.put(off, &n.to_le_bytes());
        self
    }

    pub(crate) fn warning_flags(mut self, flags: u32) -> Self {
        let t = self.layout.offsets();
        match t.warning_width {
            super::layout::FlagWidth::U16 => self.put(t.warning_flags, &(flags as u16).to_le_bytes()),
            super::layout::FlagWidth::U32 => self.put(t.warning_flags, &flags.to_le_bytes()),
        }
        self
    }

    pub(crate) fn ledger_seq(mut self, seq: u64) -> Self {
        let off = self.layout.offsets().counters + 11 * 8;
        self.put_u64(off, seq);
        self
    }

    pub(crate) fn uptime(mut self, secs: u64) -> Self {
        let off = self.layout.offsets().counters + 8;
        self.put_u64(off, secs);
        self
    }

    pub(crate) fn node_key(mut self, key: [u8; NODE_KEY_LEN]) -> Self {
        let off = self.layout.offsets().node_public_key;
        self.put(off, &key);
        self
    }

    /// Distinct, validly prefixed key derived from a small index.
    pub(crate) fn node_index(self, i: u8) -> Self {
        let mut key = [0u8; NODE_KEY_LEN];
        key[0] = 0xED;
        key[1] = i;
        self.node_key(key)
    }

    pub(crate) fn version_string(mut self, s: &str) -> Self {
        let off = self
            .layout
            .offsets()
            .version_string
            .expect("layout has no version string");
        let bytes = &s.as_bytes()[..s.len().min(VERSION_STRING_LEN)];
        self.put(off, bytes);
        self
    }

    pub(crate) fn mem(mut self, total: u64, used: u64) -> Self {
        let off = self.layout.offsets().system;
        self.put_u64(off + 8, total);
        self.put_u64(off + 24, used);
        self
    }

    pub(crate) fn disk(mut self, total: u64, used: u64) -> Self {
        let off = self.layout.offsets().system;
        self.put_u64(off + 32, total);
        self.put_u64(off + 48, used);
        self
    }

    pub(crate) fn load_avg(mut self, one: f64) -> Self {
        let off = self.layout.offsets().load_avg;
        self.put(off, &one.to_le_bytes());
        self
    }

    pub(crate) fn net_in(mut self, rate: f64) -> Self {
        let off = self.layout.offsets().rates;
        self.put(off, &rate.to_le_bytes());
        self
    }

    pub(crate) fn disk_write(mut self, rate: f64) -> Self {
        let off = self.layout.offsets().rates + 96;
        self.put(off, &rate.to_le_bytes());
        self
    }

    pub(crate) fn ranges(mut self, ranges: &[(u32, u32)]) -> Self {
        self.ranges.extend_from_slice(ranges);
        self
    }

    pub(crate) fn object(mut self, name: &str, count: u64) -> Self {
        self.objects.push((name.to_string(), count));
        self
    }

    pub(crate) fn build(mut self) -> Vec<u8> {
        let t = self.layout.offsets();
        if let Some(off) = t.ledger_range_count {
            let count = self.ranges.len() as u32;
            self.put(off, &count.to_le_bytes());
        }
        for (start, end) in &self.ranges {
            self.buf.extend_from_slice(&start.to_le_bytes());
            self.buf.extend_from_slice(&end.to_le_bytes());
        }
        for (name, count) in &self.objects {
            let mut record = [0u8; OBJECT_NAME_LEN];
            let len = name.len().min(OBJECT_NAME_LEN);
            record[..len].copy_from_slice(&name.as_bytes()[..len]);
            self.buf.extend_from_slice(&record);
            self.buf.extend_from_slice(&count.to_le_bytes());
        }
        self.buf
    }
}
