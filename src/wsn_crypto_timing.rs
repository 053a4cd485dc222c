//! Crypto timing harness
//!
//! Measures the per-packet cost of the node's crypto stages on the host so
//! the simulation can be fed realistic `aes_delay_us` / `hmac_delay_us`
//! constants. The cipher is AES-128-CTR, the tag HMAC-SHA256 and key
//! agreement X25519.

use std::time::Instant;

use ctr::cipher::{KeyIvInit, StreamCipher};
use hmac::{Hmac, Mac};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;
use x25519_dalek::{PublicKey, StaticSecret};

use crate::wsn_config::CryptoDelayConfig;
use crate::wsn_interface::SimTime;

pub const PACKET_SIZE: usize = 148;
pub const AES_KEY_SIZE: usize = 16;
pub const MAC_KEY_SIZE: usize = 32;

type Aes128Ctr = ctr::Ctr128BE<aes::Aes128>;
type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone)]
pub struct CryptoBenchConfig {
    pub packets: usize,
    pub packet_size: usize,
    pub handshakes: usize,
}

impl Default for CryptoBenchConfig {
    fn default() -> Self {
        Self {
            packets: 10_000,
            packet_size: PACKET_SIZE,
            handshakes: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CryptoTimings {
    /// encrypt + decrypt of one packet
    pub cipher_round_trip_us: f64,
    pub throughput_mbps: f64,
    /// tag generation for one packet
    pub mac_us: f64,
    pub key_exchange_ms: f64,
    /// key generation plus one agreement, per handshake
    pub handshake_overhead_ms: f64,
    /// percentage of forged tags rejected
    pub tamper_detection_rate: f64,
}

impl CryptoTimings {
    /// Stage delays for the simulation, rounded up and at least 1us each.
    pub fn to_delay_config(&self) -> CryptoDelayConfig {
        CryptoDelayConfig {
            aes_delay_us: ceil_us(self.cipher_round_trip_us / 2.0),
            hmac_delay_us: ceil_us(self.mac_us),
        }
    }
}

fn ceil_us(value: f64) -> SimTime {
    (value.ceil() as SimTime).max(1)
}

/// AES-128-CTR over `data` in place. Applying it twice with the same key and
/// IV restores the input.
pub fn apply_keystream(key: &[u8; AES_KEY_SIZE], iv: &[u8; 16], data: &mut [u8]) {
    let mut cipher = Aes128Ctr::new(key.into(), iv.into());
    cipher.apply_keystream(data);
}

fn keyed_mac(key: &[u8; MAC_KEY_SIZE]) -> HmacSha256 {
    // HMAC zero-pads keys shorter than the block
    let mut padded = hmac::digest::Key::<HmacSha256>::default();
    padded[..MAC_KEY_SIZE].copy_from_slice(key);
    <HmacSha256 as Mac>::new(&padded)
}

/// HMAC-SHA256 tag of `data`.
pub fn mac(key: &[u8; MAC_KEY_SIZE], data: &[u8]) -> [u8; 32] {
    let mut mac = keyed_mac(key);
    mac.update(data);
    mac.finalize().into_bytes().into()
}

pub fn verify_mac(key: &[u8; MAC_KEY_SIZE], data: &[u8], tag: &[u8]) -> bool {
    let mut mac = keyed_mac(key);
    mac.update(data);
    // constant time
    mac.verify_slice(tag).is_ok()
}

/// Flip one byte of a valid tag and check that verification rejects it.
pub fn forged_tag_rejected(key: &[u8; MAC_KEY_SIZE], data: &[u8]) -> bool {
    let mut forged = mac(key, data);
    forged[0] ^= 0xFF;
    !verify_mac(key, data, &forged)
}

/// One X25519 exchange; true when both sides derive the same secret.
pub fn key_exchange() -> bool {
    let alice = StaticSecret::random_from_rng(OsRng);
    let bob = StaticSecret::random_from_rng(OsRng);
    let alice_public = PublicKey::from(&alice);
    let bob_public = PublicKey::from(&bob);

    let alice_shared = alice.diffie_hellman(&bob_public);
    let bob_shared = bob.diffie_hellman(&alice_public);
    alice_shared.as_bytes() == bob_shared.as_bytes()
}

/// Key generation for both ends and a single agreement.
fn handshake_overhead() {
    let local = StaticSecret::random_from_rng(OsRng);
    let remote = StaticSecret::random_from_rng(OsRng);
    let local_public = PublicKey::from(&local);
    std::hint::black_box(remote.diffie_hellman(&local_public));
}

pub fn measure(config: &CryptoBenchConfig) -> CryptoTimings {
    let mut cipher_key = [0u8; AES_KEY_SIZE];
    let mut mac_key = [0u8; MAC_KEY_SIZE];
    let mut iv = [0u8; 16];
    let mut data = vec![0u8; config.packet_size];
    OsRng.fill_bytes(&mut cipher_key);
    OsRng.fill_bytes(&mut mac_key);
    OsRng.fill_bytes(&mut iv);
    OsRng.fill_bytes(&mut data);

    let packets = config.packets.max(1);
    let handshakes = config.handshakes.max(1);

    let start = Instant::now();
    for _ in 0..packets {
        apply_keystream(&cipher_key, &iv, &mut data);
        apply_keystream(&cipher_key, &iv, &mut data);
    }
    let cipher_elapsed = start.elapsed().as_secs_f64();

    let start = Instant::now();
    for _ in 0..packets {
        std::hint::black_box(mac(&mac_key, &data));
    }
    let mac_elapsed = start.elapsed().as_secs_f64();

    let start = Instant::now();
    let mut agreed = 0usize;
    for _ in 0..handshakes {
        if key_exchange() {
            agreed += 1;
        }
    }
    let exchange_elapsed = start.elapsed().as_secs_f64();
    if agreed != handshakes {
        log::warn!("{} of {} key exchanges disagreed", handshakes - agreed, handshakes);
    }

    let overhead_rounds = handshakes * 2;
    let start = Instant::now();
    for _ in 0..overhead_rounds {
        handshake_overhead();
    }
    let overhead_elapsed = start.elapsed().as_secs_f64();

    let rejected = (0..packets)
        .filter(|_| forged_tag_rejected(&mac_key, &data))
        .count();

    let bits = (packets * config.packet_size * 8) as f64;
    CryptoTimings {
        cipher_round_trip_us: cipher_elapsed / packets as f64 * 1e6,
        throughput_mbps: bits / (cipher_elapsed.max(f64::MIN_POSITIVE) * 1e6),
        mac_us: mac_elapsed / packets as f64 * 1e6,
        key_exchange_ms: exchange_elapsed / handshakes as f64 * 1e3,
        handshake_overhead_ms: overhead_elapsed / overhead_rounds as f64 * 1e3,
        tamper_detection_rate: rejected as f64 / packets as f64 * 100.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keystream_round_trip() {
        let key = [3u8; AES_KEY_SIZE];
        let iv = [9u8; 16];
        let original: Vec<u8> = (0..PACKET_SIZE as u32).map(|i| (i * 7) as u8).collect();

        let mut data = original.clone();
        apply_keystream(&key, &iv, &mut data);
        assert_ne!(data, original);
        apply_keystream(&key, &iv, &mut data);
        assert_eq!(data, original);
    }

    #[test]
    fn test_forged_tags_rejected() {
        let key = [1u8; 32];
        assert!(forged_tag_rejected(&key, b"Hello"));
        assert!(verify_mac(&key, b"Hello", &mac(&key, b"Hello")));
        assert!(!verify_mac(&key, b"Hello!", &mac(&key, b"Hello")));
        assert_ne!(mac(&key, b"Hello"), mac(&[2u8; 32], b"Hello"));
    }

    #[test]
    fn test_aes_ctr_known_answer() {
        // NIST SP 800-38A F.5.1, first block
        let key = [
            0x2b, 0x7e, 0x15, 0x16, 0x28, 0xae, 0xd2, 0xa6, 0xab, 0xf7, 0x15, 0x88, 0x09, 0xcf,
            0x4f, 0x3c,
        ];
        let iv = [
            0xf0, 0xf1, 0xf2, 0xf3, 0xf4, 0xf5, 0xf6, 0xf7, 0xf8, 0xf9, 0xfa, 0xfb, 0xfc, 0xfd,
            0xfe, 0xff,
        ];
        let mut block = [
            0x6b, 0xc1, 0xbe, 0xe2, 0x2e, 0x40, 0x9f, 0x96, 0xe9, 0x3d, 0x7e, 0x11, 0x73, 0x93,
            0x17, 0x2a,
        ];
        apply_keystream(&key, &iv, &mut block);
        assert_eq!(
            block,
            [
                0x87, 0x4d, 0x61, 0x91, 0xb6, 0x20, 0xe3, 0x26, 0x1b, 0xef, 0x68, 0x64, 0x99, 0x0d,
                0xb6, 0xce,
            ]
        );
    }

    #[test]
    fn test_hmac_sha256_known_answer() {
        // RFC 4231 test case 2 uses a 4 byte key; zero padding to 32 bytes
        // leaves the HMAC unchanged
        let mut key = [0u8; MAC_KEY_SIZE];
        key[..4].copy_from_slice(b"Jefe");
        let tag = mac(&key, b"what do ya want for nothing?");
        assert_eq!(
            tag,
            [
                0x5b, 0xdc, 0xc1, 0x46, 0xbf, 0x60, 0x75, 0x4e, 0x6a, 0x04, 0x24, 0x26, 0x08, 0x95,
                0x75, 0xc7, 0x5a, 0x00, 0x3f, 0x08, 0x9d, 0x27, 0x39, 0x83, 0x9d, 0xec, 0x58, 0xb9,
                0x64, 0xec, 0x38, 0x43,
            ]
        );
    }

    #[test]
    fn test_key_exchange_agrees() {
        assert!(key_exchange());
    }

    #[test]
    fn test_measure_small_run() {
        let timings = measure(&CryptoBenchConfig {
            packets: 50,
            packet_size: PACKET_SIZE,
            handshakes: 2,
        });
        assert_eq!(timings.tamper_detection_rate, 100.0);
        assert!(timings.cipher_round_trip_us >= 0.0);
        assert!(timings.key_exchange_ms >= 0.0);
        assert!(timings.handshake_overhead_ms >= 0.0);

        let delays = timings.to_delay_config();
        assert!(delays.aes_delay_us >= 1);
        assert!(delays.hmac_delay_us >= 1);
    }

    #[test]
    fn test_delay_config_rounds_up() {
        let timings = CryptoTimings {
            cipher_round_trip_us: 299.2,
            throughput_mbps: 1.0,
            mac_us: 0.3,
            key_exchange_ms: 1.0,
            handshake_overhead_ms: 1.0,
            tamper_detection_rate: 100.0,
        };
        assert_eq!(
            timings.to_delay_config(),
            CryptoDelayConfig {
                aes_delay_us: 150,
                hmac_delay_us: 1,
            }
        );
    }
}
