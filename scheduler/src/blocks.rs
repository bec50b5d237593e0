/// Parses a block list such as `"ABD"`, `"1,2,4"` or `"a3"` into a slot mask.
///
/// Letters map `a` to slot 0, `b` to slot 1 and so on. Numbers are 1-indexed
/// and read as maximal digit runs, so `"12"` is slot 11. Anything that falls
/// outside `0..slots`, and any other character, is ignored.
pub fn parse_blocks(blocks: &str, slots: usize) -> Vec<bool> {
    let mut mask = vec![false; slots];
    let lowered = blocks.to_lowercase();
    let mut chars = lowered.chars().peekable();

    while let Some(c) = chars.next() {
        if c.is_ascii_lowercase() {
            let index = (c as u8 - b'a') as usize;
            if index < slots {
                mask[index] = true;
            }
        } else if c.is_ascii_digit() {
            let mut digits = String::from(c);
            while let Some(&next) = chars.peek() {
                if !next.is_ascii_digit() {
                    break;
                }
                digits.push(next);
                chars.next();
            }
            // Runs too long for usize are out of range anyway
            if let Ok(number) = digits.parse::<usize>()
                && number >= 1
                && number - 1 < slots
            {
                mask[number - 1] = true;
            }
        }
    }

    mask
}

/// Reduces a raw availability mask to legal start slots for a session that
/// spans `block_length` consecutive slots.
///
/// Consecutive available slots are consumed in chunks of `block_length`; only
/// the first slot of each complete chunk stays marked. Partial chunks are
/// cleared.
pub fn start_slots(raw: &[bool], block_length: usize) -> Vec<bool> {
    let mut starts = vec![false; raw.len()];
    if block_length == 0 {
        return starts;
    }

    let mut run = 0;
    for (slot, &available) in raw.iter().enumerate() {
        if !available {
            run = 0;
            continue;
        }
        run += 1;
        if run == block_length {
            starts[slot + 1 - block_length] = true;
            run = 0;
        }
    }

    starts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letters_and_numbers_agree() {
        assert_eq!(parse_blocks("ABD", 4), vec![true, true, false, true]);
        assert_eq!(parse_blocks("1,2,4", 4), vec![true, true, false, true]);
        assert_eq!(parse_blocks("a, 2 and D", 4), vec![true, true, false, true]);
    }

    #[test]
    fn test_out_of_range_blocks_are_ignored() {
        assert_eq!(parse_blocks("az", 3), vec![true, false, false]);
        assert_eq!(parse_blocks("0,4,99", 3), vec![false, false, false]);
        assert_eq!(parse_blocks("", 2), vec![false, false]);
    }

    #[test]
    fn test_digit_runs_are_consumed_whole() {
        // "12" is block 12, not blocks 1 and 2
        let mask = parse_blocks("12", 12);
        assert!(mask[11]);
        assert_eq!(mask.iter().filter(|&&b| b).count(), 1);
    }

    #[test]
    fn test_single_block_sessions_keep_every_slot() {
        let raw = vec![true, false, true, true];
        assert_eq!(start_slots(&raw, 1), raw);
    }

    #[test]
    fn test_double_blocks_keep_only_chunk_starts() {
        let raw = vec![true, true, true, true];
        assert_eq!(start_slots(&raw, 2), vec![true, false, true, false]);
    }

    #[test]
    fn test_short_runs_are_cleared() {
        // b-c fits a double block, e is alone
        let raw = vec![false, true, true, false, true];
        assert_eq!(start_slots(&raw, 2), vec![false, true, false, false, false]);
        // trailing partial chunk
        let raw = vec![true, true, true];
        assert_eq!(start_slots(&raw, 2), vec![true, false, false]);
    }
}
