// On-demand digits of pi. The stream is the literal text "3.14159..."
// one character at a time; the consumer is expected to skip the '.'.

const INITIAL_DIGITS: usize = 256;

pub struct PiDigits {
    stream: String, // "3.1415..." as ascii
    computed: usize,
    pos: usize,
}

impl PiDigits {
    pub fn new() -> Self {
        let mut source = Self {
            stream: String::new(),
            computed: 0,
            pos: 0,
        };
        source.grow(INITIAL_DIGITS);
        source
    }

    /// Next character of the stream, extending the buffer when the
    /// reader catches up. Never runs out.
    pub fn next_char(&mut self) -> char {
        if self.pos >= self.stream.len() {
            self.grow(self.computed * 2);
        }
        let c = self.stream.as_bytes()[self.pos] as char;
        self.pos += 1;
        c
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    /// The last `n` characters up to the read position, for display.
    pub fn recent(&self, n: usize) -> &str {
        &self.stream[self.pos.saturating_sub(n)..self.pos]
    }

    pub fn restart(&mut self) {
        self.pos = 0;
    }

    fn grow(&mut self, digit_count: usize) {
        let digits = spigot(digit_count);
        let mut s = String::with_capacity(digits.len() + 1);
        for (i, d) in digits.iter().enumerate() {
            s.push((b'0' + d) as char);
            if i == 0 {
                s.push('.');
            }
        }
        self.computed = digits.len();
        self.stream = s;
    }
}

// Rabinowitz-Wagon spigot. Emits exactly `n` digits of pi starting with
// the leading 3. Recomputes from scratch per call; the working array is
// sized for the requested digit count, so results past `n` would be
// unsound and are never produced.
fn spigot(n: usize) -> Vec<u8> {
    let len = n * 10 / 3 + 3;
    let mut a = vec![2u64; len];
    let mut out: Vec<u8> = Vec::with_capacity(n + 8);
    let mut predigit = 0u64;
    let mut nines = 0usize;
    let mut first = true;

    while out.len() < n {
        let mut q = 0u64;
        for i in (1..len).rev() {
            let x = 10 * a[i] + q * (i as u64 + 1);
            a[i] = x % (2 * i as u64 + 1);
            q = x / (2 * i as u64 + 1);
        }
        let x = 10 * a[0] + q;
        a[0] = x % 10;
        q = x / 10;

        if q == 9 {
            nines += 1;
        } else if q == 10 {
            out.push(predigit as u8 + 1);
            for _ in 0..nines {
                out.push(0);
            }
            predigit = 0;
            nines = 0;
        } else {
            if first {
                first = false; // the initial predigit is a placeholder zero
            } else {
                out.push(predigit as u8);
            }
            for _ in 0..nines {
                out.push(9);
            }
            nines = 0;
            predigit = q;
        }
    }
    out.truncate(n);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const PI_50: &str = "31415926535897932384626433832795028841971693993751";

    #[test]
    fn spigot_matches_reference_prefix() {
        let digits = spigot(50);
        let got: String = digits.iter().map(|d| (b'0' + d) as char).collect();
        assert_eq!(got, PI_50);
    }

    #[test]
    fn stream_begins_three_point_one_four() {
        let mut pi = PiDigits::new();
        let head: String = (0..7).map(|_| pi.next_char()).collect();
        assert_eq!(head, "3.14159");
    }

    #[test]
    fn restart_rewinds_to_the_beginning() {
        let mut pi = PiDigits::new();
        for _ in 0..40 {
            pi.next_char();
        }
        pi.restart();
        assert_eq!(pi.position(), 0);
        assert_eq!(pi.next_char(), '3');
        assert_eq!(pi.next_char(), '.');
    }

    #[test]
    fn buffer_grows_past_the_initial_batch() {
        let mut pi = PiDigits::new();
        let mut tail = ' ';
        for _ in 0..(INITIAL_DIGITS * 3) {
            tail = pi.next_char();
        }
        assert!(tail.is_ascii_digit());
        assert_eq!(pi.position(), INITIAL_DIGITS * 3);
    }

    #[test]
    fn growth_preserves_earlier_digits() {
        let mut small = PiDigits::new();
        let head: String = (0..100).map(|_| small.next_char()).collect();
        let mut big = PiDigits::new();
        for _ in 0..(INITIAL_DIGITS * 2) {
            big.next_char();
        }
        big.restart();
        let head_again: String = (0..100).map(|_| big.next_char()).collect();
        assert_eq!(head, head_again);
    }
}
