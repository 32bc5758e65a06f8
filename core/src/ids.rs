use rand::Rng;

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

fn to_base36(mut n: u64) -> String {
    if n == 0 {
        return "0".into();
    }
    let mut digits = Vec::new();
    while n > 0 {
        digits.push(BASE36[(n % 36) as usize]);
        n /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}

/// `USER-<millis base36>-<5 random base36>`, upper-cased.
///
/// Collisions are possible in principle; nothing checks the user collection.
pub fn generate_user_id() -> String {
    let mut rng = rand::thread_rng();
    let random: String = (0..5)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    format!("USER-{}-{}", to_base36(crate::time::now_millis()), random).to_uppercase()
}

/// Six digit code, uniform over 100000..=999999.
pub fn generate_otp() -> String {
    rand::thread_rng().gen_range(100_000..=999_999u32).to_string()
}
