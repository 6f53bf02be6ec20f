use crate::normalizer::AliasTable;


// Ending rewrites, first match wins: genitive/adjective forms towards the nominative.
const MORPH_ENDINGS: &[(&str, &str)] = &[
    ("ского", "ский"),
    ("сого", "сый"),
    ("его", "ий"),
    ("ого", "ий"),
    ("ской", "ская"),
    ("цкой", "цкая"),
    ("ой", "ая"),
    ("ые", "ый"),
    ("ых", "ый"),
    ("их", "ий"),
];

// Street types whose long form is indexed in full names often enough to deserve a phrase variant.
const PHRASE_LONG_FORMS: &[&str] = &["пр-д", "ул", "пер", "пр-кт", "б-р", "пл", "ш", "наб"];


/// Spellings a korpus value is stored under.
pub fn korpus_variants(korpus: &str) -> Vec<String> {
    vec![
        korpus.to_string(),
        format!("к {}", korpus),
        format!("к.{}", korpus),
        format!("к{}", korpus),
        format!("корп {}", korpus),
        format!("корп. {}", korpus),
        format!("корп.{}", korpus),
        format!("корпус {}", korpus),
        format!("кор. {}", korpus),
        format!("кор.{}", korpus),
    ]
}

/// Spellings a stroenie value is stored under, ownership (владение) forms included.
pub fn stroenie_variants(stroenie: &str) -> Vec<String> {
    vec![
        stroenie.to_string(),
        format!("с {}", stroenie),
        format!("с.{}", stroenie),
        format!("стр {}", stroenie),
        format!("стр. {}", stroenie),
        format!("стр.{}", stroenie),
        format!("строение {}", stroenie),
        format!("вл {}", stroenie),
        format!("вл.{}", stroenie),
        format!("влад {}", stroenie),
        format!("влад. {}", stroenie),
        format!("влад.{}", stroenie),
        format!("владение {}", stroenie),
        format!("влд {}", stroenie),
        format!("влд.{}", stroenie),
    ]
}

/// Korpus and stroenie folded into the korpus field, `"к 1 с 2"` style. Both parts keep their
/// qualifier word.
pub fn combined_korpus_variants(korpus: &str, stroenie: &str) -> Vec<String> {
    let mut combined = Vec::new();
    for k in korpus_variants(korpus).into_iter().skip(1) {
        for s in stroenie_variants(stroenie).into_iter().skip(1) {
            combined.push(format!("{} {}", k, s));
        }
    }
    combined
}

/// Korpus-field spellings used by indexes that keep stroenie in the korpus column.
pub fn stroenie_in_korpus_variants(stroenie: &str) -> Vec<String> {
    vec![format!("стр {}", stroenie), format!("стр.{}", stroenie)]
}

/// Input first, then `е`→`ё` and `ё`→`е` rewrites when they change anything.
pub fn yo_variants(text: &str) -> Vec<String> {
    let mut variants = vec![text.to_string()];
    if text.contains('е') {
        variants.push(text.replace('е', "ё"));
    }
    if text.contains('ё') {
        variants.push(text.replace('ё', "е"));
    }
    variants
}

/// Light nominative rewrite of every word: `савеловского вокзала` → `савеловский вокзала`.
pub fn morph_variant(text: &str) -> Option<String> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let rewritten: Vec<String> = tokens.iter().map(|t| nominative(t)).collect();
    if rewritten.iter().zip(tokens.iter()).all(|(a, b)| a == b) {
        return None;
    }
    Some(rewritten.join(" "))
}

fn nominative(token: &str) -> String {
    if token.chars().any(|c| c.is_ascii_digit()) {
        return token.to_string();
    }
    for (ending, replacement) in MORPH_ENDINGS {
        if let Some(stem) = token.strip_suffix(ending) {
            return format!("{}{}", stem, replacement);
        }
    }
    token.to_string()
}

/// One variant per (token, alternative) pair, swapping adjective long and short forms.
pub fn abbreviation_variants(text: &str, table: &AliasTable) -> Vec<String> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let mut variants = Vec::new();

    for (i, token) in tokens.iter().enumerate() {
        let alternatives: Vec<&str> = if let Some(shorts) = table.adjective_short_forms(token) {
            shorts.to_vec()
        } else if let Some(long) = table.adjective_long_form(token) {
            vec![long]
        } else {
            continue;
        };

        for alternative in alternatives {
            let mut swapped = tokens.clone();
            swapped[i] = alternative;
            let variant = swapped.join(" ");
            if variant != text && !variants.contains(&variant) {
                variants.push(variant);
            }
        }
    }
    variants
}

/// `"<name> <type>"` for the last street type in `typed_body`: the words after the type when
/// there are any, otherwise the single word before it.
pub fn street_phrase(typed_body: &str, table: &AliasTable) -> Option<String> {
    let tokens: Vec<&str> = typed_body.split_whitespace().collect();
    let type_idx = tokens.iter().rposition(|t| table.is_street_canonical(t))?;
    let street_type = tokens[type_idx];

    if type_idx + 1 < tokens.len() {
        Some(format!("{} {}", tokens[type_idx + 1..].join(" "), street_type))
    } else if type_idx >= 1 {
        Some(format!("{} {}", tokens[type_idx - 1], street_type))
    } else {
        None
    }
}

/// Street phrase plus its е/ё spellings and the long-type spelling of each.
pub fn street_phrase_variants(phrase: &str, table: &AliasTable) -> Vec<String> {
    let mut variants: Vec<String> = Vec::new();
    for v in yo_variants(phrase) {
        if !variants.contains(&v) {
            variants.push(v);
        }
    }

    for variant in variants.clone() {
        let Some((name, street_type)) = variant.rsplit_once(' ') else {
            continue;
        };
        if !PHRASE_LONG_FORMS.contains(&street_type) {
            continue;
        }
        if let Some(long) = table.long_form(street_type) {
            let expanded = format!("{} {}", name, long);
            if !variants.contains(&expanded) {
                variants.push(expanded);
            }
        }
    }
    variants
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_korpus_variants_keep_plain_value_first() {
        let variants = korpus_variants("2");
        assert_eq!(variants[0], "2");
        assert!(variants.contains(&"корп. 2".to_string()));
        assert!(variants.contains(&"к2".to_string()));
        assert_eq!(variants.len(), 10);
    }

    #[test]
    fn test_stroenie_variants_include_ownership_forms() {
        let variants = stroenie_variants("5");
        assert!(variants.contains(&"стр.5".to_string()));
        assert!(variants.contains(&"вл 5".to_string()));
        assert!(variants.contains(&"владение 5".to_string()));
        assert_eq!(variants.len(), 15);
    }

    #[test]
    fn test_combined_variants() {
        let combined = combined_korpus_variants("1", "2");
        assert_eq!(combined.len(), 126);
        assert!(!combined.contains(&"1 2".to_string()));
        assert!(combined.contains(&"к 1 с 2".to_string()));
    }

    #[test]
    fn test_yo_variants() {
        assert_eq!(yo_variants("тверская"), vec!["тверская", "твёрская"]);
        assert_eq!(yo_variants("мира"), vec!["мира"]);
    }

    #[test]
    fn test_morph_variant() {
        assert_eq!(morph_variant("савеловского вокзала").as_deref(), Some("савеловский вокзала"));
        assert_eq!(morph_variant("красной армии").as_deref(), Some("красная армии"));
        assert_eq!(morph_variant("мира 12"), None);
    }

    #[test]
    fn test_morph_variant_leaves_digits() {
        assert_eq!(morph_variant("2ого"), None);
    }

    #[test]
    fn test_abbreviation_variants_both_directions() {
        let table = AliasTable::standard();
        let from_long = abbreviation_variants("большая серпуховская ул", table);
        assert_eq!(from_long, vec!["б серпуховская ул"]);

        let from_short = abbreviation_variants("пром зона", table);
        assert_eq!(from_short, vec!["промышленная зона"]);
    }

    #[test]
    fn test_abbreviation_variants_multiple_shorts() {
        let table = AliasTable::standard();
        let variants = abbreviation_variants("средняя ул", table);
        assert_eq!(variants, vec!["ср ул", "с ул"]);
    }

    #[test]
    fn test_street_phrase_type_first() {
        let table = AliasTable::standard();
        assert_eq!(street_phrase("ул юлиана семенова", table).as_deref(), Some("юлиана семенова ул"));
    }

    #[test]
    fn test_street_phrase_type_last() {
        let table = AliasTable::standard();
        assert_eq!(street_phrase("москва ленина ул", table).as_deref(), Some("ленина ул"));
        assert_eq!(street_phrase("ул", table), None);
        assert_eq!(street_phrase("ленина", table), None);
    }

    #[test]
    fn test_street_phrase_variants_add_long_type() {
        let table = AliasTable::standard();
        let variants = street_phrase_variants("мира пр-кт", table);
        assert_eq!(variants[0], "мира пр-кт");
        assert!(variants.contains(&"мира проспект".to_string()));
    }
}
