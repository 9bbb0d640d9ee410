use once_cell::sync::Lazy;
use regex::Regex;

pub const DEFAULT_DIMENSIONS: (u32, u32) = (1024, 1024);

// Dimensions accepted by the SDXL 1.0 text-to-image endpoint. Tie-breaking in
// nearest_allowed depends on this ordering.
pub const ALLOWED_SDXL_DIMENSIONS: [(u32, u32); 9] = [
    (1024, 1024),
    (1152, 896),
    (1216, 832),
    (1344, 768),
    (1536, 640),
    (640, 1536),
    (768, 1344),
    (832, 1216),
    (896, 1152),
];

static DIGIT_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("valid digit regex"));

pub fn nearest_allowed(width: u32, height: u32) -> (u32, u32) {
    let mut best = ALLOWED_SDXL_DIMENSIONS[0];
    let mut best_distance = u64::MAX;
    for &(allowed_width, allowed_height) in &ALLOWED_SDXL_DIMENSIONS {
        // The two distances can sum past u32::MAX; widen before adding.
        let distance = u64::from(allowed_width.abs_diff(width))
            + u64::from(allowed_height.abs_diff(height));
        if distance < best_distance {
            best = (allowed_width, allowed_height);
            best_distance = distance;
        }
    }
    best
}

pub fn parse_size_string(raw: &str) -> (u32, u32) {
    if !raw.contains('x') {
        return DEFAULT_DIMENSIONS;
    }

    let numbers: Vec<u32> = DIGIT_RUN_RE
        .find_iter(raw)
        .filter_map(|m| m.as_str().parse::<u32>().ok())
        .collect();
    match numbers.as_slice() {
        [width, height, ..] => (*width, *height),
        _ => DEFAULT_DIMENSIONS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allowed_dimensions_map_to_themselves() {
        for &(width, height) in &ALLOWED_SDXL_DIMENSIONS {
            assert_eq!(nearest_allowed(width, height), (width, height));
        }
    }

    #[test]
    fn output_is_always_a_member_of_the_allow_list() {
        let requests = [
            (0, 0),
            (1, 1),
            (300, 250),
            (728, 90),
            (1200, 630),
            (1920, 1080),
            (600, 300),
            (10_000, 10),
        ];
        for (width, height) in requests {
            let mapped = nearest_allowed(width, height);
            assert!(
                ALLOWED_SDXL_DIMENSIONS.contains(&mapped),
                "{width}x{height} mapped to {mapped:?}"
            );
        }
    }

    #[test]
    fn nine_hundred_by_five_hundred_resolves_by_explicit_distance() {
        let (width, height) = (900, 500);
        let mut expected = ALLOWED_SDXL_DIMENSIONS[0];
        let mut expected_distance = u32::MAX;
        for &(allowed_width, allowed_height) in &ALLOWED_SDXL_DIMENSIONS {
            let distance = allowed_width.abs_diff(width) + allowed_height.abs_diff(height);
            if distance < expected_distance {
                expected = (allowed_width, allowed_height);
                expected_distance = distance;
            }
        }
        // (1024,1024), (1152,896) and (1216,832) all sit at distance 648; the
        // first listed entry wins.
        assert_eq!(expected_distance, 648);
        assert_eq!(expected, (1024, 1024));
        assert_eq!(nearest_allowed(width, height), expected);
    }

    #[test]
    fn ties_resolve_to_the_earliest_listed_entry() {
        // (1088, 960) is 64+64 away from both (1024,1024) and (1152,896).
        assert_eq!(nearest_allowed(1088, 960), (1024, 1024));
    }

    #[test]
    fn maximal_sizes_map_without_overflowing() {
        // Every entry's distance from (u32::MAX, u32::MAX) exceeds u32::MAX;
        // the largest edge sum, (1536, 640), sits nearest.
        assert_eq!(nearest_allowed(u32::MAX, u32::MAX), (1536, 640));
    }

    #[test]
    fn pixel_size_strings_parse_to_their_first_two_numbers() {
        assert_eq!(parse_size_string("728x90 pixels"), (728, 90));
        assert_eq!(parse_size_string("1200x630 pixels"), (1200, 630));
    }

    #[test]
    fn print_size_in_inches_parses_digit_runs() {
        // "8.5" splits into the runs 8 and 5; units are ignored.
        assert_eq!(parse_size_string("8.5x11 inches"), (8, 5));
    }

    #[test]
    fn strings_without_an_x_fall_back_to_the_default() {
        assert_eq!(parse_size_string("fullpage"), DEFAULT_DIMENSIONS);
        assert_eq!(parse_size_string(""), DEFAULT_DIMENSIONS);
    }

    #[test]
    fn single_number_falls_back_to_the_default() {
        assert_eq!(parse_size_string("1024x"), DEFAULT_DIMENSIONS);
    }
}
