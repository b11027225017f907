//! Conversion des clés d'attributs géométriques
//!
//! `CAPTURE_DATE` => `captureDate`. Transformation purement lexicale : une
//! clé inconnue est convertie de la même façon qu'une clé connue.

/// Convertit une clé UPPER_SNAKE_CASE en lowerCamelCase
///
/// Le premier segment est mis en minuscules, les suivants en casse titre
/// (majuscule après tout caractère non alphabétique, minuscules ensuite).
pub fn camel_case(snake: &str) -> String {
    let mut segments = snake.split('_');
    let mut out = String::with_capacity(snake.len());

    if let Some(first) = segments.next() {
        out.push_str(&first.to_lowercase());
    }
    for segment in segments {
        push_title_case(&mut out, segment);
    }

    out
}

fn push_title_case(out: &mut String, segment: &str) {
    let mut previous_cased = false;
    for c in segment.chars() {
        if c.is_alphabetic() {
            if previous_cased {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            previous_cased = true;
        } else {
            out.push(c);
            previous_cased = false;
        }
    }
}

/// Vrai si la clé désigne une information de hauteur (`ACCURACY_HEIGHT`...)
///
/// Ces clés n'ont de sens que sur une géométrie 3D.
pub fn is_height_key(key: &str) -> bool {
    key.split('_').any(|segment| segment.eq_ignore_ascii_case("HEIGHT"))
}
