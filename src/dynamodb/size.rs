use super::value::{Record, TypedValue};

/// Estimate item size in bytes using DynamoDB item size rules.
/// This is an estimate (sets are treated like lists).
pub fn estimate_item_size_bytes(item: &Record) -> usize {
    item.iter()
        .map(|(name, value)| name.len() + estimate_value_size_bytes(value))
        .sum()
}

fn estimate_value_size_bytes(value: &TypedValue) -> usize {
    match value {
        TypedValue::S(text) => text.len(),
        TypedValue::N(num) => number_size_bytes(num),
        TypedValue::B(bytes) => bytes.len(),
        TypedValue::Bool(_) | TypedValue::Null => 1,
        TypedValue::L(list) => {
            let values_size: usize = list.iter().map(estimate_value_size_bytes).sum();
            3 + list.len() + values_size
        }
        TypedValue::M(map) => 3 + map.len() + estimate_item_size_bytes(map),
        TypedValue::Ss(set) => {
            let values_size: usize = set.iter().map(String::len).sum();
            3 + set.len() + values_size
        }
        TypedValue::Ns(set) => {
            let values_size: usize = set.iter().map(|n| number_size_bytes(n)).sum();
            3 + set.len() + values_size
        }
        TypedValue::Bs(set) => {
            let values_size: usize = set.iter().map(Vec::len).sum();
            3 + set.len() + values_size
        }
    }
}

fn number_size_bytes(num: &str) -> usize {
    let mut s = num.trim();
    if s.is_empty() {
        return 1;
    }
    if let Some(rest) = s.strip_prefix('-') {
        s = rest;
    }
    if let Some(rest) = s.strip_prefix('+') {
        s = rest;
    }

    let coeff = match s.find(['e', 'E']) {
        Some(idx) => &s[..idx],
        None => s,
    };
    let has_decimal = coeff.contains('.');
    let mut digits: String = coeff.chars().filter(|c| *c != '.').collect();
    digits = digits.trim_start_matches('0').to_string();
    if has_decimal {
        digits = digits.trim_end_matches('0').to_string();
    }
    let count = if digits.is_empty() { 1 } else { digits.len() };
    count.div_ceil(2) + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_cost_one_byte_per_two_digits_plus_one() {
        assert_eq!(number_size_bytes("0"), 2);
        assert_eq!(number_size_bytes("12345"), 4);
        assert_eq!(number_size_bytes("-001.2300"), 3);
        assert_eq!(number_size_bytes("1e10"), 2);
    }

    #[test]
    fn item_size_counts_names_and_nested_values() {
        let inner: Record = [("a".to_string(), TypedValue::S("xy".into()))]
            .into_iter()
            .collect();
        let item: Record = [
            ("pk".to_string(), TypedValue::S("abc".into())),
            ("m".to_string(), TypedValue::M(inner)),
            ("flag".to_string(), TypedValue::Bool(true)),
        ]
        .into_iter()
        .collect();
        // pk: 2 + 3, m: 1 + (3 + 1 + 1 + 2), flag: 4 + 1
        assert_eq!(estimate_item_size_bytes(&item), 18);
    }
}
