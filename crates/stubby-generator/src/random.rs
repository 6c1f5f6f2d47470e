use crate::Generator;
use parking_lot::Mutex;
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use stubby_core::{GeneratorError, ShortCode, DEFAULT_ALPHABET, DEFAULT_CODE_LENGTH};
use typed_builder::TypedBuilder;

/// Draws a `length`-symbol code from `alphabet` using the operating system's
/// secure random source.
///
/// Symbols are picked independently and uniformly by index, so a symbol that
/// appears twice in `alphabet` is twice as likely to be drawn.
pub fn generate(length: usize, alphabet: &str) -> Result<String, GeneratorError> {
    generate_with(&mut OsRng, length, alphabet)
}

/// Same as [`generate`], drawing from the given cryptographically secure source.
pub fn generate_with<R>(rng: &mut R, length: usize, alphabet: &str) -> Result<String, GeneratorError>
where
    R: RngCore + CryptoRng + ?Sized,
{
    let symbols: Vec<char> = alphabet.chars().collect();
    draw(rng, length, &symbols)
}

fn draw<R>(rng: &mut R, length: usize, symbols: &[char]) -> Result<String, GeneratorError>
where
    R: RngCore + ?Sized,
{
    if length == 0 {
        return Err(GeneratorError::ZeroLength);
    }
    if symbols.is_empty() {
        return Err(GeneratorError::EmptyAlphabet);
    }

    let mut code = String::with_capacity(length);
    for _ in 0..length {
        let index = uniform_index(rng, symbols.len())?;
        code.push(symbols[index]);
    }
    Ok(code)
}

/// Picks an index in `0..bound` without modulo bias.
///
/// Raw 64-bit draws at or above the largest multiple of `bound` are rejected
/// and redrawn.
fn uniform_index<R>(rng: &mut R, bound: usize) -> Result<usize, GeneratorError>
where
    R: RngCore + ?Sized,
{
    let bound = bound as u64;
    let zone = u64::MAX - (u64::MAX % bound);

    loop {
        let mut bytes = [0u8; 8];
        rng.try_fill_bytes(&mut bytes)
            .map_err(|e| GeneratorError::Entropy(e.to_string()))?;
        let value = u64::from_le_bytes(bytes);
        if value < zone {
            return Ok((value % bound) as usize);
        }
    }
}

#[derive(Debug, Clone, TypedBuilder)]
pub struct GeneratorSettings {
    /// Number of symbols per code.
    #[builder(default = DEFAULT_CODE_LENGTH)]
    pub length: usize,
    /// Symbols codes are drawn from.
    #[builder(default = DEFAULT_ALPHABET.to_string(), setter(into))]
    pub alphabet: String,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Generates fixed-length random codes from a fixed alphabet.
#[derive(Debug)]
pub struct RandomGenerator<R = OsRng> {
    length: usize,
    symbols: Vec<char>,
    rng: Mutex<R>,
}

impl RandomGenerator<OsRng> {
    /// Creates a generator backed by the operating system's random source.
    pub fn new(settings: GeneratorSettings) -> Result<Self, GeneratorError> {
        Self::with_rng(settings, OsRng)
    }
}

impl Default for RandomGenerator<OsRng> {
    fn default() -> Self {
        Self {
            length: DEFAULT_CODE_LENGTH,
            symbols: DEFAULT_ALPHABET.chars().collect(),
            rng: Mutex::new(OsRng),
        }
    }
}

impl<R: RngCore + CryptoRng> RandomGenerator<R> {
    /// Creates a generator drawing from `rng`.
    ///
    /// Settings are checked up front so a misconfigured generator is rejected
    /// at startup rather than on the first allocation.
    pub fn with_rng(settings: GeneratorSettings, rng: R) -> Result<Self, GeneratorError> {
        if settings.length == 0 {
            return Err(GeneratorError::ZeroLength);
        }
        let symbols: Vec<char> = settings.alphabet.chars().collect();
        if symbols.is_empty() {
            return Err(GeneratorError::EmptyAlphabet);
        }

        Ok(Self {
            length: settings.length,
            symbols,
            rng: Mutex::new(rng),
        })
    }

    pub fn length(&self) -> usize {
        self.length
    }
}

impl<R: RngCore + CryptoRng + Send + 'static> Generator for RandomGenerator<R> {
    fn generate(&self) -> Result<ShortCode, GeneratorError> {
        let mut rng = self.rng.lock();
        let code = draw(&mut *rng, self.length, &self.symbols)?;
        Ok(ShortCode::new_unchecked(code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet, VecDeque};

    /// Replays a fixed list of 64-bit values.
    struct ScriptedRng {
        values: VecDeque<u64>,
    }

    impl ScriptedRng {
        fn new(values: impl IntoIterator<Item = u64>) -> Self {
            Self {
                values: values.into_iter().collect(),
            }
        }
    }

    impl RngCore for ScriptedRng {
        fn next_u32(&mut self) -> u32 {
            self.next_u64() as u32
        }

        fn next_u64(&mut self) -> u64 {
            self.values.pop_front().expect("scripted rng exhausted")
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            self.try_fill_bytes(dest).expect("scripted rng exhausted")
        }

        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
            let value = self
                .values
                .pop_front()
                .ok_or_else(|| rand::Error::new("scripted rng exhausted"))?;
            dest.copy_from_slice(&value.to_le_bytes()[..dest.len()]);
            Ok(())
        }
    }

    impl CryptoRng for ScriptedRng {}

    /// A source that always fails.
    struct BrokenRng;

    impl RngCore for BrokenRng {
        fn next_u32(&mut self) -> u32 {
            unreachable!()
        }

        fn next_u64(&mut self) -> u64 {
            unreachable!()
        }

        fn fill_bytes(&mut self, _dest: &mut [u8]) {
            unreachable!()
        }

        fn try_fill_bytes(&mut self, _dest: &mut [u8]) -> Result<(), rand::Error> {
            Err(rand::Error::new("entropy source unavailable"))
        }
    }

    impl CryptoRng for BrokenRng {}

    #[test]
    fn output_has_requested_length_and_alphabet() {
        for _ in 0..100 {
            let code = generate(6, DEFAULT_ALPHABET).unwrap();
            assert_eq!(code.chars().count(), 6);
            assert!(code.chars().all(|c| DEFAULT_ALPHABET.contains(c)));
        }
    }

    #[test]
    fn symbols_are_picked_in_draw_order() {
        let mut rng = ScriptedRng::new([0, 1, 2, 4]);
        let code = generate_with(&mut rng, 4, "abc").unwrap();
        assert_eq!(code, "abcb");
    }

    #[test]
    fn draws_in_the_biased_tail_are_rejected() {
        // u64::MAX is a multiple of 3, so it sits outside the accepted zone.
        let mut rng = ScriptedRng::new([u64::MAX, 1]);
        let code = generate_with(&mut rng, 1, "abc").unwrap();
        assert_eq!(code, "b");
    }

    #[test]
    fn duplicate_symbols_are_kept() {
        let mut rng = ScriptedRng::new([0, 1, 2]);
        let code = generate_with(&mut rng, 3, "aab").unwrap();
        assert_eq!(code, "aab");
    }

    #[test]
    fn zero_length_is_rejected() {
        assert_eq!(generate(0, "abc"), Err(GeneratorError::ZeroLength));
    }

    #[test]
    fn empty_alphabet_is_rejected() {
        assert_eq!(generate(6, ""), Err(GeneratorError::EmptyAlphabet));
    }

    #[test]
    fn entropy_failure_is_surfaced() {
        let err = generate_with(&mut BrokenRng, 6, DEFAULT_ALPHABET).unwrap_err();
        assert!(matches!(err, GeneratorError::Entropy(_)));
    }

    #[test]
    fn generator_rejects_invalid_settings() {
        let zero = GeneratorSettings::builder().length(0).build();
        assert_eq!(
            RandomGenerator::new(zero).unwrap_err(),
            GeneratorError::ZeroLength
        );

        let empty = GeneratorSettings::builder().alphabet("").build();
        assert_eq!(
            RandomGenerator::new(empty).unwrap_err(),
            GeneratorError::EmptyAlphabet
        );
    }

    #[test]
    fn generator_surfaces_entropy_failure() {
        let generator = RandomGenerator::with_rng(GeneratorSettings::default(), BrokenRng).unwrap();
        assert!(matches!(
            generator.generate(),
            Err(GeneratorError::Entropy(_))
        ));
    }

    #[test]
    fn default_generator_produces_six_symbol_codes() {
        let generator = RandomGenerator::default();
        let code = generator.generate().unwrap();
        assert_eq!(code.as_str().len(), DEFAULT_CODE_LENGTH);
        assert_eq!(generator.length(), DEFAULT_CODE_LENGTH);
    }

    #[test]
    fn consecutive_codes_differ() {
        let generator = RandomGenerator::default();
        let codes: HashSet<String> = (0..1_000)
            .map(|_| generator.generate().unwrap().into_inner())
            .collect();
        // 36^6 possible codes; a repeat among 1000 draws is vanishingly unlikely.
        assert_eq!(codes.len(), 1_000);
    }

    #[test]
    fn symbol_frequencies_pass_chi_square() {
        let mut counts: HashMap<char, u64> = HashMap::new();
        for _ in 0..10_000 {
            for c in generate(6, DEFAULT_ALPHABET).unwrap().chars() {
                *counts.entry(c).or_default() += 1;
            }
        }

        let bins = DEFAULT_ALPHABET.chars().count();
        assert_eq!(counts.len(), bins);

        let expected = 60_000.0 / bins as f64;
        let chi_square: f64 = counts
            .values()
            .map(|&observed| {
                let diff = observed as f64 - expected;
                diff * diff / expected
            })
            .sum();

        // 35 degrees of freedom; 80 is far past the 0.01% critical value.
        assert!(chi_square < 80.0, "chi-square too large: {chi_square}");
    }

    #[test]
    fn generator_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RandomGenerator>();
    }
}
