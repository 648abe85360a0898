use gallery_backend::access::code::{generate_code, hash_code};
use std::env;

fn main() {
    // Hash the given code, or mint-and-hash a fresh one with no argument.
    let plaintext = env::args().nth(1).unwrap_or_else(generate_code);

    let hashed = hash_code(&plaintext);

    println!("\nCode : {}", plaintext);
    println!("Hint : {}", hashed.hint);
    println!("Salt : {}", hashed.salt);
    println!("Hash : {}\n", hashed.hash);
    println!("# Seed an access token with:");
    println!(
        "INSERT INTO access_tokens (gallery_id, code_hash, code_salt, code_hint) \
         VALUES ('<gallery-uuid>', '{}', '{}', '{}');",
        hashed.hash, hashed.salt, hashed.hint
    );
}
