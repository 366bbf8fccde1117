/// Hash a logical asset path the way the game does (32-bit FNV-1).
///
/// Note the order: multiply first, then xor. This is FNV-1, not FNV-1a, and the
/// game's index lookup is a binary search over these values.
pub fn hash_path(path: &str) -> u32 {
    path.as_bytes().iter().fold(0x811c_9dc5u32, |hash, &byte| {
        hash.wrapping_mul(0x0100_0193) ^ u32::from(byte)
    })
}
