// Host-side tests for fluid records, the fallback merge and the recipe book.

use alchemy_core::*;
use glam::Vec3;

fn close(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-4
}

#[test]
fn empty_partial_becomes_the_default() {
    let void = FluidPropertyRecord::liquid_void();
    let merged = fallback_merge(&PartialFluidRecord::default(), &void);
    assert_eq!(merged, void);
}

#[test]
fn present_fields_win_and_missing_ones_fall_back() {
    let void = FluidPropertyRecord::liquid_void();
    let partial = PartialFluidRecord {
        name: Some("  Ember Tea ".into()),
        highlight_color: Some("#fff".into()),
        glow: Some(2.5),
        ..PartialFluidRecord::default()
    };
    let merged = fallback_merge(&partial, &void);
    assert_eq!(merged.name, "Ember Tea");
    assert_eq!(merged.highlight_color, Vec3::ONE);
    assert_eq!(merged.glow, 2.5);
    assert_eq!(merged.description, void.description);
    assert_eq!(merged.base_color, void.base_color);
    assert_eq!(merged.particle_size, void.particle_size);
}

#[test]
fn invalid_values_count_as_missing() {
    let void = FluidPropertyRecord::liquid_void();
    let partial = PartialFluidRecord {
        name: Some("   ".into()),
        base_color: Some("#12345".into()),
        viscosity: Some(f32::NAN),
        flow_speed: Some(f32::INFINITY),
        chaos: Some(-0.4),
        ..PartialFluidRecord::default()
    };
    let merged = fallback_merge(&partial, &void);
    assert_eq!(merged.name, void.name);
    assert_eq!(merged.base_color, void.base_color);
    assert_eq!(merged.viscosity, void.viscosity);
    assert_eq!(merged.flow_speed, void.flow_speed);
    assert_eq!(merged.chaos, 0.0);
}

#[test]
fn hex_colors_parse_in_both_widths() {
    assert_eq!(parse_hex_color("#fff"), Some(Vec3::ONE));
    assert_eq!(parse_hex_color("000000"), Some(Vec3::ZERO));
    let c = parse_hex_color("#ff8000").unwrap();
    assert!(close(c.x, 1.0) && close(c.y, 128.0 / 255.0) && close(c.z, 0.0));
    assert_eq!(parse_hex_color("#F0F"), parse_hex_color("#ff00ff"));

    for bad in ["", "#", "#12", "#1234", "#gggggg", "#ééé", "red"] {
        assert_eq!(parse_hex_color(bad), None, "accepted {bad:?}");
    }
}

#[test]
fn hex_output_is_lowercase_and_clamped() {
    assert_eq!(to_hex_color(Vec3::new(1.0, 0.0, 0.5)), "#ff0080");
    assert_eq!(to_hex_color(Vec3::new(2.0, -1.0, 0.0)), "#ff0000");
}

#[test]
fn reply_parses_camel_case_subset() {
    let partial = parse_reply(r##"{"name":"Storm Glass","flowSpeed":0.7,"baseColor":"#ff0000"}"##)
        .unwrap();
    assert_eq!(partial.name.as_deref(), Some("Storm Glass"));
    assert_eq!(partial.flow_speed, Some(0.7));
    assert_eq!(partial.base_color.as_deref(), Some("#ff0000"));
    assert_eq!(partial.viscosity, None);

    // Extra keys are ignored.
    assert!(parse_reply(r#"{"mood":"grim"}"#).is_ok());
}

#[test]
fn serialized_record_reads_back_as_a_full_reply() {
    let water = FluidPropertyRecord::pure_water();
    let text = serde_json::to_string(&PartialFluidRecord::from(&water)).unwrap();
    assert!(text.contains("\"flowSpeed\":0.2"), "{text}");
    assert!(text.contains("\"baseColor\":\"#0ea5e9\""), "{text}");

    let partial = parse_reply(&text).unwrap();
    let merged = fallback_merge(&partial, &FluidPropertyRecord::liquid_void());
    assert_eq!(merged, water);
}

#[test]
fn malformed_reply_is_an_error() {
    for text in [r#"{"name":"#, r#"{"glow":"bright"}"#, "[]", ""] {
        assert!(
            matches!(parse_reply(text), Err(ComposerError::Malformed(_))),
            "accepted {text:?}"
        );
    }
}

#[test]
fn builtin_recipe_book_has_every_pool_element() {
    let book = RecipeBook::builtin().unwrap();
    assert_eq!(book.len(), ELEMENT_POOL.len());
    for element in ELEMENT_POOL {
        assert!(book.tincture(element.name).is_some(), "{}", element.name);
    }
    assert!(book.tincture("IGNIS").is_some());
}

#[test]
fn recipe_book_composes_from_the_current_fluid() {
    let book = RecipeBook::builtin().unwrap();
    let water = FluidPropertyRecord::pure_water();
    let partial = book.compose(&water, "Ignis").unwrap();
    assert_eq!(partial.name.as_deref(), Some("Boiling Water"));
    assert!(partial.description.is_some());
    assert!(close(partial.flow_speed.unwrap(), water.flow_speed + 0.25));
    assert!(close(partial.glow.unwrap(), water.glow + 0.4));

    let merged = fallback_merge(&partial, &FluidPropertyRecord::liquid_void());
    assert_eq!(merged.name, "Boiling Water");
    assert!(merged.base_color.x > water.base_color.x);
}

#[test]
fn recipe_without_description_takes_the_fallback_text() {
    let book = RecipeBook::builtin().unwrap();
    let partial = book
        .compose(&FluidPropertyRecord::pure_water(), "Terra")
        .unwrap();
    assert_eq!(partial.description, None);
    let void = FluidPropertyRecord::liquid_void();
    assert_eq!(fallback_merge(&partial, &void).description, void.description);
}

#[test]
fn unknown_ingredient_is_rejected() {
    let book = RecipeBook::builtin().unwrap();
    match book.compose(&FluidPropertyRecord::pure_water(), "Quintessence") {
        Err(ComposerError::UnknownIngredient(name)) => assert_eq!(name, "Quintessence"),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn recipe_book_rejects_bad_json() {
    assert!(matches!(
        RecipeBook::from_json("{\"Ignis\": 3}"),
        Err(ComposerError::Malformed(_))
    ));
    let book = RecipeBook::from_json("{}").unwrap();
    assert!(book.is_empty());
}
