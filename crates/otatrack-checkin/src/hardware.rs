//! Synthetic hardware identity
//!
//! The endpoint expects a plausible handset: IMEI, Wi-Fi MAC, serial number and a
//! settings digest. The values are random but seeded from the SHA-256 of the build
//! fingerprint, so every run presents the same handset for the same build.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sha2::{Digest, Sha256};

/// Type allocation code prefix used for generated IMEIs
const IMEI_TAC_PREFIX: [u8; 2] = [3, 5];
/// Digits in an IMEI, check digit included
const IMEI_LEN: usize = 15;

/// Hardware identifiers presented in a check-in request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntheticHardware {
    /// 15-digit IMEI with a valid Luhn check digit
    pub imei: String,
    /// Wi-Fi MAC address as 12 lowercase hex digits
    pub mac: String,
    /// Serial number as 12 uppercase hex digits
    pub serial: String,
    /// Settings digest, `1-` followed by 40 hex digits
    pub digest: String,
}

impl SyntheticHardware {
    /// Stable identity for a fingerprint
    pub fn for_fingerprint(fingerprint: &str) -> Self {
        let seed: [u8; 32] = Sha256::digest(fingerprint.as_bytes()).into();
        Self::from_rng(&mut StdRng::from_seed(seed))
    }

    fn from_rng(rng: &mut StdRng) -> Self {
        let mut digits: Vec<u8> = IMEI_TAC_PREFIX.to_vec();
        while digits.len() < IMEI_LEN - 1 {
            digits.push(rng.random_range(0..10));
        }
        digits.push(luhn_check_digit(&digits));
        let imei = digits.iter().map(|d| char::from(b'0' + d)).collect();

        let mut mac = [0u8; 6];
        rng.fill(&mut mac);
        // locally administered, unicast
        if let Some(first) = mac.first_mut() {
            *first = (*first | 0x02) & 0xfe;
        }

        let mut serial = [0u8; 6];
        rng.fill(&mut serial);

        let mut digest = [0u8; 20];
        rng.fill(&mut digest);

        Self {
            imei,
            mac: hex::encode(mac),
            serial: hex::encode_upper(serial),
            digest: format!("1-{}", hex::encode(digest)),
        }
    }
}

/// Luhn check digit for a digit sequence that does not yet include it
pub fn luhn_check_digit(digits: &[u8]) -> u8 {
    let sum: u32 = digits
        .iter()
        .rev()
        .enumerate()
        .map(|(position, &digit)| {
            let digit = u32::from(digit);
            if position % 2 == 0 {
                let doubled = digit * 2;
                if doubled > 9 { doubled - 9 } else { doubled }
            } else {
                digit
            }
        })
        .sum();
    // always < 10
    ((10 - sum % 10) % 10) as u8
}

/// Whether a full digit string passes the Luhn check
pub fn luhn_valid(number: &str) -> bool {
    let Some(digits) = number
        .chars()
        .map(|c| c.to_digit(10).map(|d| d as u8))
        .collect::<Option<Vec<u8>>>()
    else {
        return false;
    };
    match digits.split_last() {
        Some((&check, body)) => luhn_check_digit(body) == check,
        None => false,
    }
}
