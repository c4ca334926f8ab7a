use castroom_core::RoomCode;
use rand::Rng;

/// A random code of `len` characters from [`RoomCode::ALPHABET`].
pub fn generate_room_code(len: usize) -> RoomCode {
    let mut rng = rand::thread_rng();
    let code: String = (0..len)
        .map(|_| RoomCode::ALPHABET[rng.gen_range(0..RoomCode::ALPHABET.len())] as char)
        .collect();
    RoomCode::new(code)
}
