use super::*;

#[test]
fn parse_plain_and_secret() {
    assert_eq!("int".parse(), Ok(Datatype::plain(PrimitiveKind::Int)));
    assert_eq!(
        "secret double".parse(),
        Ok(Datatype::secret(PrimitiveKind::Double))
    );
    assert_eq!(
        "  secret   bool ".parse(),
        Ok(Datatype::secret(PrimitiveKind::Bool))
    );
}

#[test]
fn parse_rejects_garbage() {
    assert!("secretint".parse::<Datatype>().is_err());
    assert!("secret".parse::<Datatype>().is_err());
    assert!("long".parse::<Datatype>().is_err());
}

#[test]
fn display_round_trips() {
    for kind in [
        PrimitiveKind::Bool,
        PrimitiveKind::Char,
        PrimitiveKind::Int,
        PrimitiveKind::Float,
        PrimitiveKind::Double,
        PrimitiveKind::String,
    ] {
        for secret in [false, true] {
            let datatype = Datatype::new(kind, secret);
            assert_eq!(datatype.to_string().parse(), Ok(datatype));
        }
    }
}

#[test]
fn numeric_kinds() {
    assert!(PrimitiveKind::Int.is_numeric());
    assert!(PrimitiveKind::Float.is_numeric());
    assert!(!PrimitiveKind::Bool.is_numeric());
    assert!(!PrimitiveKind::String.is_numeric());
}
