use color_lib::{Color, Context};
use itertools::Itertools;
use palette_sort::STANDARD;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

fn colors(xs: &[&str]) -> Vec<Color> {
    xs.iter().map(|s| s.to_string()).collect()
}

fn palettes() -> Vec<Vec<Color>> {
    vec![
        colors(&["#ff0000", "#00ff00", "#0000ff"]),
        colors(&[
            "#1a1c2c", "#5d275d", "#b13e53", "#ef7d57", "#ffcd75", "#a7f070", "#38b764", "#257179",
            "#29366f", "#3b5dc9", "#41a6f6", "#73eff7", "#f4f4f4", "#94b0c2", "#566c86", "#333c57",
        ]),
        colors(&[
            "#000000", "#808080", "#808080", "#ffffff", "#FF0000", "#ff0000", "#204080", "#c0c0c0",
        ]),
    ]
}

fn sorted_copy(xs: &[Color]) -> Vec<Color> {
    xs.iter().cloned().sorted().collect()
}

#[test]
fn test_every_method_returns_a_permutation() {
    let mut ctx = Context::new();
    for palette in palettes() {
        for method in STANDARD.methods().iter().filter(|m| m.is_valid(&palette)) {
            let out = method.sort(&palette, &mut ctx).unwrap();
            assert_eq!(sorted_copy(&out), sorted_copy(&palette), "{}", method.id);
        }
    }
}

#[test]
fn test_order_independent() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut ctx = Context::new();
    for palette in palettes() {
        let mut shuffled = palette.clone();
        shuffled.shuffle(&mut rng);
        for method in STANDARD.methods().iter().filter(|m| m.id != "NONE" && m.is_valid(&palette)) {
            let a = method.sort(&palette, &mut ctx).unwrap();
            let b = method.sort(&shuffled, &mut ctx).unwrap();
            assert_eq!(a, b, "{}", method.id);
        }
    }
}

#[test]
fn test_repeatable_with_fresh_context() {
    for palette in palettes() {
        for method in STANDARD.methods().iter().filter(|m| m.is_valid(&palette)) {
            let a = method.sort(&palette, &mut Context::new()).unwrap();
            let b = method.sort(&palette, &mut Context::new()).unwrap();
            assert_eq!(a, b, "{}", method.id);
        }
    }
}

#[test]
fn test_tiny_palettes_pass_through() {
    let mut ctx = Context::new();
    let single = colors(&["#123456"]);
    for method in STANDARD.methods().iter().filter(|m| m.is_valid(&single)) {
        assert_eq!(method.sort(&single, &mut ctx).unwrap(), single, "{}", method.id);
        assert!(method.sort(&[], &mut ctx).unwrap().is_empty(), "{}", method.id);
    }
}
