//! Decoding of telemetry datagrams.
//!
//! One skeleton serves every layout: fields are read from the offsets in the
//! layout's [`FieldOffsets`] table. Reads past the end of the buffer yield
//! zero, so a short buffer still produces a (partial) snapshot.

use tracing::{debug, warn};

use super::error::DecodeError;
use super::layout::{
    FieldOffsets, FlagWidth, LayoutVersion, DEBUG_COUNTER_SLOTS, MAGIC, OBJECT_NAME_LEN,
    OBJECT_RECORD_LEN, RANGE_LEN, VERSION_STRING_LEN,
};
use super::packet::{
    DebugCounters, IoRates, LedgerRange, LoadAverage, NodeKey, ObjectCount, RateStat,
    StateAccounting, SystemMetrics, TelemetryPacket, TelemetrySnapshot, NODE_KEY_LEN,
};

/// Bounds-checked little-endian reader over a datagram.
struct Reader<'a> {
    buf: &'a [u8],
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    fn slice(&self, offset: usize, len: usize) -> Option<&'a [u8]> {
        let end = offset.checked_add(len)?;
        self.buf.get(offset..end)
    }

    fn array<const N: usize>(&self, offset: usize) -> Option<[u8; N]> {
        self.slice(offset, N)?.try_into().ok()
    }

    fn try_u32(&self, offset: usize) -> Option<u32> {
        self.array::<4>(offset).map(u32::from_le_bytes)
    }

    fn u16(&self, offset: usize) -> u16 {
        self.array::<2>(offset).map(u16::from_le_bytes).unwrap_or_default()
    }

    fn u32(&self, offset: usize) -> u32 {
        self.try_u32(offset).unwrap_or_default()
    }

    /// 64-bit value stored as a low then a high 32-bit half.
    fn u64(&self, offset: usize) -> u64 {
        let low = self.u32(offset);
        let high = self.u32(offset + 4);
        (u64::from(high) << 32) | u64::from(low)
    }

    fn f64(&self, offset: usize) -> f64 {
        self.array::<8>(offset).map(f64::from_le_bytes).unwrap_or_default()
    }

    fn bytes<const N: usize>(&self, offset: usize) -> [u8; N] {
        self.array::<N>(offset).unwrap_or([0; N])
    }

    fn u64s<const N: usize>(&self, offset: usize) -> [u64; N] {
        std::array::from_fn(|i| self.u64(offset + i * 8))
    }
}

/// Decode one datagram using the given layout.
///
/// Only a wrong magic word or an unsupported protocol version is an error.
/// Truncation never is: missing header fields read as zero, and a variable
/// section that would run past the buffer decodes as empty.
pub fn decode(buf: &[u8], layout: LayoutVersion) -> Result<TelemetryPacket, DecodeError> {
    let table = layout.offsets();
    let r = Reader::new(buf);

    if let Some(found) = table.magic.and_then(|off| r.try_u32(off)) {
        if found != MAGIC {
            return Err(DecodeError::BadMagic { expected: MAGIC, found });
        }
    }

    let version = r.u32(table.version);
    if let (Some(accepted), Some(_)) = (&table.accepted_versions, r.try_u32(table.version)) {
        if !accepted.contains(&version) {
            return Err(DecodeError::UnsupportedVersion { version, layout });
        }
    }

    let header_complete = buf.len() >= table.header_len;
    if !header_complete {
        warn!(
            len = buf.len(),
            needed = table.header_len,
            %layout,
            "telemetry datagram shorter than fixed header"
        );
    }

    let snapshot = read_snapshot(&r, table, version);

    let (ranges, objects) = if header_complete {
        read_variable_sections(&r, table)
    } else {
        (Vec::new(), Vec::new())
    };

    let debug = match table.debug_counters {
        Some(off) if header_complete => Some(read_debug_counters(&r, off)),
        _ => None,
    };

    Ok(TelemetryPacket {
        snapshot,
        ranges,
        objects,
        debug,
        header_complete,
    })
}

fn read_snapshot(r: &Reader<'_>, t: &FieldOffsets, version: u32) -> TelemetrySnapshot {
    let warning_flags = match t.warning_width {
        FlagWidth::U16 => u32::from(r.u16(t.warning_flags)),
        FlagWidth::U32 => r.u32(t.warning_flags),
    };

    let [timestamp, uptime, io_latency_us, validation_quorum, fetch_pack_size, proposer_count, converge_time_ms, load_factor, load_base, reserve_base, reserve_inc, ledger_seq] =
        r.u64s::<12>(t.counters);

    let [process_mem_pages, mem_total, mem_free, mem_used, disk_total, disk_free, disk_used, io_wait_time] =
        r.u64s::<8>(t.system);

    let state_accounting = t.state_accounting.map(|off| StateAccounting {
        transitions: r.u64s::<5>(off),
        durations_us: r.u64s::<5>(off + 40),
        initial_sync_us: r.u64(off + 80),
    });

    TelemetrySnapshot {
        version,
        network_id: r.u32(t.network_id),
        server_state: r.u32(t.server_state).into(),
        peer_count: r.u32(t.peer_count),
        node_size: r.u32(t.node_size),
        cpu_cores: r.u32(t.cpu_cores),
        warning_flags,
        timestamp,
        uptime,
        io_latency_us,
        validation_quorum,
        fetch_pack_size,
        proposer_count,
        converge_time_ms,
        load_factor,
        load_base,
        reserve_base,
        reserve_inc,
        ledger_seq,
        ledger_hash: r.bytes::<32>(t.ledger_hash),
        node_public_key: NodeKey(r.bytes::<NODE_KEY_LEN>(t.node_public_key)),
        version_string: t
            .version_string
            .and_then(|off| trimmed_text(&r.bytes::<VERSION_STRING_LEN>(off))),
        system: SystemMetrics {
            process_mem_pages,
            mem_total,
            mem_free,
            mem_used,
            disk_total,
            disk_free,
            disk_used,
            io_wait_time,
        },
        load_avg: LoadAverage {
            one: r.f64(t.load_avg),
            five: r.f64(t.load_avg + 8),
            fifteen: r.f64(t.load_avg + 16),
        },
        state_accounting,
        rates: IoRates {
            net_in: read_rate(r, t.rates),
            net_out: read_rate(r, t.rates + 32),
            disk_read: read_rate(r, t.rates + 64),
            disk_write: read_rate(r, t.rates + 96),
        },
    }
}

fn read_rate(r: &Reader<'_>, off: usize) -> RateStat {
    RateStat {
        one_minute: r.f64(off),
        five_minutes: r.f64(off + 8),
        one_hour: r.f64(off + 16),
        one_day: r.f64(off + 24),
    }
}

fn read_variable_sections(
    r: &Reader<'_>,
    t: &FieldOffsets,
) -> (Vec<LedgerRange>, Vec<ObjectCount>) {
    let len = r.buf.len();

    let Some(count_off) = t.ledger_range_count else {
        // Layouts without a count carry exactly one range in the last 8 bytes.
        let ranges = if len >= t.header_len + RANGE_LEN {
            vec![read_range(r, len - RANGE_LEN)]
        } else {
            Vec::new()
        };
        return (ranges, Vec::new());
    };

    let count = r.u32(count_off) as usize;
    let ranges_end = count
        .checked_mul(RANGE_LEN)
        .and_then(|n| n.checked_add(t.header_len))
        .filter(|&end| end <= len);

    let Some(ranges_end) = ranges_end else {
        debug!(count, len, "ledger range count overruns datagram, ignoring ranges");
        return (Vec::new(), Vec::new());
    };

    let ranges = (0..count).map(|i| read_range(r, t.header_len + i * RANGE_LEN)).collect();

    let objects = if t.object_table {
        read_objects(r, ranges_end)
    } else {
        Vec::new()
    };

    (ranges, objects)
}

fn read_range(r: &Reader<'_>, off: usize) -> LedgerRange {
    LedgerRange {
        start: r.u32(off),
        end: r.u32(off + 4),
    }
}

fn read_objects(r: &Reader<'_>, start: usize) -> Vec<ObjectCount> {
    let tail = &r.buf[start..];
    if tail.len() % OBJECT_RECORD_LEN != 0 {
        debug!(
            trailing = tail.len() % OBJECT_RECORD_LEN,
            "ignoring partial object count record"
        );
    }

    tail.chunks_exact(OBJECT_RECORD_LEN)
        .filter_map(|record| {
            let name = trimmed_text(&record[..OBJECT_NAME_LEN])?;
            let count = Reader::new(&record[OBJECT_NAME_LEN..]).u64(0);
            Some(ObjectCount { name, count })
        })
        .collect()
}

fn read_debug_counters(r: &Reader<'_>, off: usize) -> DebugCounters {
    let v = r.u64s::<DEBUG_COUNTER_SLOTS>(off);
    let rate = |i: usize| r.f64(off + i * 8);
    DebugCounters {
        db_kb_total: v[0],
        db_kb_ledger: v[1],
        db_kb_transaction: v[2],
        local_txs: v[3],
        write_load: v[4],
        historical_per_minute: v[5],
        sle_hit_rate: rate(6),
        ledger_hit_rate: rate(7),
        accepted_ledger_size: v[8],
        accepted_ledger_hit_rate: rate(9),
        full_below_size: v[10],
        tree_node_cache_size: v[11],
        tree_node_track_size: v[12],
        node_read_bytes: v[13],
        node_reads_total: v[14],
        node_reads_hit: v[15],
        node_writes: v[16],
        node_written_bytes: v[17],
        node_read_duration_us: v[18],
        node_writes_delayed: v[19],
        read_queue: v[20],
        read_request_bundle: v[21],
        read_threads_running: v[22],
        read_threads_total: v[23],
        cache_hit_rate: rate(24),
    }
}

/// Text from a null-padded field, or `None` if nothing is left after trimming.
fn trimmed_text(field: &[u8]) -> Option<String> {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    let text = String::from_utf8_lossy(&field[..end]);
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::testutil::PacketBuilder;

    #[test]
    fn decodes_current_header_fields() {
        let buf = PacketBuilder::new(LayoutVersion::Current)
            .peer_count(21)
            .cpu_cores(8)
            .ledger_seq(91_234_567)
            .warning_flags(0b0100)
            .version_string("rippled-2.3.0")
            .build();

        let packet = decode(&buf, LayoutVersion::Current).unwrap();
        let s = &packet.snapshot;
        assert!(packet.header_complete);
        assert_eq!(s.version, 3);
        assert_eq!(s.peer_count, 21);
        assert_eq!(s.cpu_cores, 8);
        assert_eq!(s.ledger_seq, 91_234_567);
        assert_eq!(s.warning_flags, 0b0100);
        assert_eq!(s.version_string.as_deref(), Some("rippled-2.3.0"));
        assert!(s.state_accounting.is_some());
        assert!(packet.debug.is_some());
    }

    #[test]
    fn version_sits_right_after_magic() {
        let buf = PacketBuilder::new(LayoutVersion::Current).build();
        assert_eq!(&buf[0..4], b"XLTM");
        assert_eq!(u32::from_le_bytes(buf[4..8].try_into().unwrap()), 3);
    }

    #[test]
    fn u64_is_rebuilt_from_low_and_high_halves() {
        let mut buf = PacketBuilder::new(LayoutVersion::Current).build();
        let off = LayoutVersion::Current.offsets().counters + 11 * 8;
        buf[off..off + 4].copy_from_slice(&7u32.to_le_bytes());
        buf[off + 4..off + 8].copy_from_slice(&2u32.to_le_bytes());

        let packet = decode(&buf, LayoutVersion::Current).unwrap();
        assert_eq!(packet.snapshot.ledger_seq, 2 * (1u64 << 32) + 7);
    }

    #[test]
    fn decoding_is_deterministic() {
        let buf = PacketBuilder::new(LayoutVersion::Current)
            .ranges(&[(1, 10), (20, 30)])
            .object("NodeObject", 42)
            .build();

        let a = decode(&buf, LayoutVersion::Current).unwrap();
        let b = decode(&buf, LayoutVersion::Current).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn short_buffer_yields_partial_snapshot() {
        let full = PacketBuilder::new(LayoutVersion::Current).peer_count(5).build();
        let packet = decode(&full[..100], LayoutVersion::Current).unwrap();

        assert!(!packet.header_complete);
        assert_eq!(packet.snapshot.peer_count, 5);
        assert!(packet.snapshot.node_public_key.is_zero());
        assert!(packet.ranges.is_empty());
        assert!(packet.objects.is_empty());
        assert!(packet.debug.is_none());
    }

    #[test]
    fn empty_buffer_does_not_fail() {
        for layout in LayoutVersion::ALL {
            let packet = decode(&[], layout).unwrap();
            assert!(!packet.header_complete);
            assert!(packet.ranges.is_empty());
        }
    }

    #[test]
    fn reads_declared_ledger_ranges_in_order() {
        let buf = PacketBuilder::new(LayoutVersion::Current)
            .ranges(&[(100, 200), (300, 400), (500, 600)])
            .build();

        let packet = decode(&buf, LayoutVersion::Current).unwrap();
        assert_eq!(
            packet.ranges,
            vec![
                LedgerRange { start: 100, end: 200 },
                LedgerRange { start: 300, end: 400 },
                LedgerRange { start: 500, end: 600 },
            ]
        );
    }

    #[test]
    fn overrunning_range_count_yields_no_ranges() {
        let mut buf = PacketBuilder::new(LayoutVersion::Current).ranges(&[(1, 2)]).build();
        let count_off = LayoutVersion::Current.offsets().ledger_range_count.unwrap();
        buf[count_off..count_off + 4].copy_from_slice(&3u32.to_le_bytes());

        let packet = decode(&buf, LayoutVersion::Current).unwrap();
        assert!(packet.header_complete);
        assert!(packet.ranges.is_empty());
        assert!(packet.objects.is_empty());
    }

    #[test]
    fn huge_range_count_does_not_overflow() {
        let mut buf = PacketBuilder::new(LayoutVersion::Compact).build();
        let count_off = LayoutVersion::Compact.offsets().ledger_range_count.unwrap();
        buf[count_off..count_off + 4].copy_from_slice(&u32::MAX.to_le_bytes());

        let packet = decode(&buf, LayoutVersion::Compact).unwrap();
        assert!(packet.ranges.is_empty());
    }

    #[test]
    fn object_table_strips_padding_and_drops_blank_names() {
        let buf = PacketBuilder::new(LayoutVersion::Current)
            .ranges(&[(1, 2)])
            .object("AccountRoot", 1_000)
            .object("", 77)
            .object("Offer", 12)
            .build();

        let packet = decode(&buf, LayoutVersion::Current).unwrap();
        assert_eq!(
            packet.objects,
            vec![
                ObjectCount { name: "AccountRoot".into(), count: 1_000 },
                ObjectCount { name: "Offer".into(), count: 12 },
            ]
        );
    }

    #[test]
    fn partial_object_record_is_ignored() {
        let mut buf = PacketBuilder::new(LayoutVersion::Current).object("Ledger", 3).build();
        buf.extend_from_slice(&[b'X'; 20]);

        let packet = decode(&buf, LayoutVersion::Current).unwrap();
        assert_eq!(packet.objects.len(), 1);
        assert_eq!(packet.objects[0].name, "Ledger");
    }

    #[test]
    fn wrong_magic_is_rejected() {
        let mut buf = PacketBuilder::new(LayoutVersion::Current).build();
        buf[0] = b'Y';

        let err = decode(&buf, LayoutVersion::Current).unwrap_err();
        assert!(matches!(err, DecodeError::BadMagic { .. }));
    }

    #[test]
    fn unsupported_version_is_rejected() {
        let buf = PacketBuilder::new(LayoutVersion::Compact).version(3).build();
        let err = decode(&buf, LayoutVersion::Compact).unwrap_err();
        assert!(matches!(err, DecodeError::UnsupportedVersion { version: 3, .. }));
    }

    #[test]
    fn compact_layout_has_no_version_string_or_debug_block() {
        let buf = PacketBuilder::new(LayoutVersion::Compact)
            .mem(1000, 250)
            .ranges(&[(5, 9)])
            .build();

        let packet = decode(&buf, LayoutVersion::Compact).unwrap();
        assert!(packet.snapshot.version_string.is_none());
        assert!(packet.debug.is_none());
        assert_eq!(packet.snapshot.system.mem_total, 1000);
        assert_eq!(packet.snapshot.system.mem_used, 250);
        assert_eq!(packet.ranges, vec![LedgerRange { start: 5, end: 9 }]);
    }

    #[test]
    fn legacy_layout_reads_16_bit_flags_and_trailing_range() {
        let mut buf = PacketBuilder::new(LayoutVersion::Legacy).warning_flags(0b1001).build();
        // Upper half of a 32-bit read would land in padding; it must be ignored.
        let flags_off = LayoutVersion::Legacy.offsets().warning_flags;
        buf[flags_off + 2] = 0xFF;
        buf.extend_from_slice(&10u32.to_le_bytes());
        buf.extend_from_slice(&99u32.to_le_bytes());

        let packet = decode(&buf, LayoutVersion::Legacy).unwrap();
        assert_eq!(packet.snapshot.warning_flags, 0b1001);
        assert!(packet.snapshot.state_accounting.is_none());
        assert_eq!(packet.ranges, vec![LedgerRange { start: 10, end: 99 }]);
        assert!(packet.objects.is_empty());
    }

    #[test]
    fn legacy_layout_without_tail_has_no_range() {
        let buf = PacketBuilder::new(LayoutVersion::Legacy).build();
        let packet = decode(&buf, LayoutVersion::Legacy).unwrap();
        assert!(packet.header_complete);
        assert!(packet.ranges.is_empty());
    }

    #[test]
    fn rates_and_load_are_read_as_doubles() {
        let buf = PacketBuilder::new(LayoutVersion::Current)
            .net_in(1_048_576.5)
            .disk_write(42.25)
            .load_avg(1.5)
            .build();

        let s = decode(&buf, LayoutVersion::Current).unwrap().snapshot;
        assert_eq!(s.rates.net_in.one_minute, 1_048_576.5);
        assert_eq!(s.rates.disk_write.one_minute, 42.25);
        assert_eq!(s.load_avg.one, 1.5);
    }

    #[test]
    fn trimmed_text_handles_padding_and_whitespace() {
        assert_eq!(trimmed_text(b"abc\0\0\0").as_deref(), Some("abc"));
        assert_eq!(trimmed_text(b"  v1 \0junk").as_deref(), Some("v1"));
        assert_eq!(trimmed_text(&[0u8; 8]), None);
    }
}
