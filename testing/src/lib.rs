// Utilities used in tests and benches.

/// Packs `data` into the byte stream a MO file would contain,
/// little or big endian.
pub fn create_binary_content(data: &[u32], le: bool) -> Vec<u8> {
    let mut buf: Vec<u8> = vec![];
    for value in data {
        match le {
            true => buf.extend(value.to_le_bytes()),
            false => buf.extend(value.to_be_bytes()),
        }
    }
    buf
}

/// Like [create_binary_content] with trailing garbage, to build
/// corrupted streams.
pub fn create_corrupted_binary_content(
    data: &[u32],
    le: bool,
    additional_bytes: &[u8],
) -> Vec<u8> {
    let mut buf = create_binary_content(data, le);
    buf.extend(additional_bytes);
    buf
}
