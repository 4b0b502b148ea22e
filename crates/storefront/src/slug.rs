//! Product URL slugs of the form `{name}-i,{id}`.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Separator between the readable name and the product id.
const ID_SEPARATOR: &str = "-i,";

/// Characters dropped from names before they become slugs.
const STRIPPED: &[char] = &[
    '!', '@', '%', '^', '*', '(', ')', '+', '=', '<', '>', '?', '/', ',', '.', ':', ';', '\'',
    '"', '&', '#', '[', ']', '~', '$', '_', '`', '-', '{', '}', '|', '\\',
];

/// Fold Latin diacritics to ASCII and drop URL-hostile punctuation.
///
/// Whitespace is preserved.
#[must_use]
pub fn remove_special_character(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            'đ' => 'd',
            'Đ' => 'D',
            other => other,
        })
        .nfd()
        .filter(|c| !is_combining_mark(*c) && !STRIPPED.contains(c))
        .collect()
}

/// Build the slug for a product.
///
/// ```
/// use shoplet_storefront::slug::generate_name_id;
///
/// assert_eq!(generate_name_id("Áo Thun!", "abc123"), "Ao-Thun-i,abc123");
/// ```
#[must_use]
pub fn generate_name_id(name: &str, id: &str) -> String {
    let readable: String = remove_special_character(name)
        .chars()
        .map(|c| if c.is_whitespace() { '-' } else { c })
        .collect();
    format!("{readable}{ID_SEPARATOR}{id}")
}

/// Extract the product id from a slug: the text after the last `-i,`.
///
/// Input without the separator is returned unchanged, so a bare id works too.
#[must_use]
pub fn get_id_from_name_id(name_id: &str) -> &str {
    name_id
        .rsplit_once(ID_SEPARATOR)
        .map_or(name_id, |(_, id)| id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_name_id() {
        assert_eq!(generate_name_id("Áo Thun!", "abc123"), "Ao-Thun-i,abc123");
    }

    #[test]
    fn test_vietnamese_folding() {
        assert_eq!(
            remove_special_character("Điện thoại đẹp"),
            "Dien thoai dep"
        );
        assert_eq!(remove_special_character("Giày Nữ"), "Giay Nu");
    }

    #[test]
    fn test_strips_punctuation() {
        assert_eq!(
            remove_special_character("a!b@c%d^e*f(g)h+i=j<k>l?m/n,o.p:q;r's\"t&u#v[w]x~y$z_`-{}|\\"),
            "abcdefghijklmnopqrstuvwxyz"
        );
    }

    #[test]
    fn test_each_whitespace_becomes_dash() {
        assert_eq!(generate_name_id("a  b\tc", "1"), "a--b-c-i,1");
    }

    #[test]
    fn test_get_id_from_name_id() {
        assert_eq!(get_id_from_name_id("Ao-Thun-i,abc123"), "abc123");
        assert_eq!(get_id_from_name_id("x-i,y-i,z"), "z");
        assert_eq!(get_id_from_name_id("abc123"), "abc123");
    }

    #[test]
    fn test_slug_round_trip_id() {
        let slug = generate_name_id("Ốp lưng -i, điện thoại", "60afb2c76ef5b902180aacba");
        assert_eq!(get_id_from_name_id(&slug), "60afb2c76ef5b902180aacba");
    }
}
