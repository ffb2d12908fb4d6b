//! Video duration probing
//!
//! Reads the movie header (`moov/mvhd`) of an ISO-BMFF (MP4/MOV) file.
//! Anything else yields `None`.

const BOX_HEADER_LEN: usize = 8;

/// Duration in seconds, if the data is an MP4 with a readable `mvhd` box
pub fn mp4_duration_seconds(data: &[u8]) -> Option<f64> {
    let moov = find_box(data, b"moov")?;
    let mvhd = find_box(moov, b"mvhd")?;
    parse_mvhd(mvhd)
}

/// Body of the first box named `name` among the sibling boxes in `data`
fn find_box<'a>(data: &'a [u8], name: &[u8; 4]) -> Option<&'a [u8]> {
    let mut cursor = 0usize;

    while data.len().saturating_sub(cursor) >= BOX_HEADER_LEN {
        let size = read_u32(data, cursor)? as u64;
        let kind = data.get(cursor + 4..cursor + 8)?;

        let (header_len, box_len) = match size {
            0 => (BOX_HEADER_LEN, (data.len() - cursor) as u64),
            1 => (BOX_HEADER_LEN + 8, read_u64(data, cursor + 8)?),
            n => (BOX_HEADER_LEN, n),
        };

        if box_len < header_len as u64 {
            return None;
        }
        let end = cursor.checked_add(usize::try_from(box_len).ok()?)?;
        if end > data.len() {
            return None;
        }

        if kind == name {
            return data.get(cursor + header_len..end);
        }
        cursor = end;
    }

    None
}

fn parse_mvhd(body: &[u8]) -> Option<f64> {
    let version = *body.first()?;
    // version(1) + flags(3)
    let fields = 4;

    let (timescale, duration) = match version {
        0 => (read_u32(body, fields + 8)?, read_u32(body, fields + 12)? as u64),
        1 => (read_u32(body, fields + 16)?, read_u64(body, fields + 20)?),
        _ => return None,
    };

    if timescale == 0 {
        return None;
    }

    Some(duration as f64 / timescale as f64)
}

fn read_u32(data: &[u8], at: usize) -> Option<u32> {
    let bytes: [u8; 4] = data.get(at..at + 4)?.try_into().ok()?;
    Some(u32::from_be_bytes(bytes))
}

fn read_u64(data: &[u8], at: usize) -> Option<u64> {
    let bytes: [u8; 8] = data.get(at..at + 8)?.try_into().ok()?;
    Some(u64::from_be_bytes(bytes))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    fn mp4_box(kind: &[u8; 4], body: &[u8]) -> Vec<u8> {
        let mut out = ((body.len() + BOX_HEADER_LEN) as u32).to_be_bytes().to_vec();
        out.extend_from_slice(kind);
        out.extend_from_slice(body);
        out
    }

    /// Minimal MP4: `ftyp` followed by `moov/mvhd` (version 0)
    pub(crate) fn sample_mp4(timescale: u32, duration: u32) -> Vec<u8> {
        let mut mvhd = vec![0u8; 4];
        mvhd.extend_from_slice(&0u32.to_be_bytes());
        mvhd.extend_from_slice(&0u32.to_be_bytes());
        mvhd.extend_from_slice(&timescale.to_be_bytes());
        mvhd.extend_from_slice(&duration.to_be_bytes());
        mvhd.extend_from_slice(&[0u8; 80]);

        let mut file = mp4_box(b"ftyp", b"isom\0\0\0\0isommp41");
        file.extend(mp4_box(b"free", &[0u8; 16]));
        file.extend(mp4_box(b"moov", &mp4_box(b"mvhd", &mvhd)));
        file
    }

    #[test]
    fn reads_version_0_duration() {
        let data = sample_mp4(1000, 12_500);
        assert_eq!(mp4_duration_seconds(&data), Some(12.5));
    }

    #[test]
    fn reads_version_1_duration() {
        let mut mvhd = vec![1u8, 0, 0, 0];
        mvhd.extend_from_slice(&0u64.to_be_bytes());
        mvhd.extend_from_slice(&0u64.to_be_bytes());
        mvhd.extend_from_slice(&600u32.to_be_bytes());
        mvhd.extend_from_slice(&1800u64.to_be_bytes());
        let data = mp4_box(b"moov", &mp4_box(b"mvhd", &mvhd));

        assert_eq!(mp4_duration_seconds(&data), Some(3.0));
    }

    #[test]
    fn non_mp4_data_has_no_duration() {
        assert_eq!(mp4_duration_seconds(b"definitely not a movie"), None);
        assert_eq!(mp4_duration_seconds(&[]), None);
    }

    #[test]
    fn truncated_box_has_no_duration() {
        let mut data = sample_mp4(1000, 5000);
        data.truncate(data.len() - 40);
        assert_eq!(mp4_duration_seconds(&data), None);
    }

    #[test]
    fn zero_timescale_has_no_duration() {
        let data = sample_mp4(0, 5000);
        assert_eq!(mp4_duration_seconds(&data), None);
    }
}
