use super::Dynamic;

/// Serialise an evaluated value to text.
///
/// Arrays and maps are written element by element so nested numbers keep
/// the same formatting as scalar results.
pub fn serialise_value(value: &Dynamic) -> String {
    if value.is_unit() {
        String::new()
    } else if let Ok(n) = value.as_float() {
        format_number(n)
    } else if let Ok(n) = value.as_int() {
        n.to_string()
    } else if let Ok(b) = value.as_bool() {
        if b { "TRUE" } else { "FALSE" }.to_string()
    } else if value.is_string() || value.is_char() {
        value.to_string()
    } else if let Some(array) = value.read_lock::<rhai::Array>() {
        let items: Vec<String> = array.iter().map(serialise_value).collect();
        format!("[{}]", items.join(", "))
    } else if let Some(map) = value.read_lock::<rhai::Map>() {
        let items: Vec<String> = map
            .iter()
            .map(|(k, v)| format!("{}: {}", k, serialise_value(v)))
            .collect();
        format!("{{{}}}", items.join(", "))
    } else {
        value.to_string()
    }
}

/// Format a number for display.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "#NAN!".to_string()
    } else if n.is_infinite() {
        "#INF!".to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e10 {
        format!("{:.0}", n)
    } else {
        format!("{}", n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(10.0), "10");
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(f64::NAN), "#NAN!");
        assert_eq!(format_number(f64::INFINITY), "#INF!");
    }

    #[test]
    fn test_serialise_array() {
        let array: rhai::Array = vec![Dynamic::from(1_i64), Dynamic::from(2.5_f64)];
        assert_eq!(serialise_value(&Dynamic::from(array)), "[1, 2.5]");
    }

    #[test]
    fn test_serialise_scalars() {
        assert_eq!(serialise_value(&Dynamic::UNIT), "");
        assert_eq!(serialise_value(&Dynamic::from(true)), "TRUE");
        assert_eq!(serialise_value(&Dynamic::from("hi")), "hi");
    }
}
