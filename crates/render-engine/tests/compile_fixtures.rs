use std::path::PathBuf;

use reframe_processing_core::compose;
use reframe_render_engine::{compile, Dialect};
use reframe_timeline::{EditScript, TimelineModel};

fn load_fixture(name: &str) -> TimelineModel {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("fixtures")
        .join("scripts")
        .join(name);

    EditScript::load(path)
        .expect("fixture script should load")
        .apply()
        .expect("fixture script should apply")
}

/// Evaluates a rendered filter expression the way ffmpeg's expression
/// parser reads it: `+ -` below `* /`, left-associative, unary minus,
/// `if`/`lt`/`gte`/`pow` calls and the `t`/`it` time variables.
struct RenderedEval<'a> {
    src: &'a [u8],
    pos: usize,
    time: f64,
}

impl<'a> RenderedEval<'a> {
    fn eval(src: &'a str, time: f64) -> f64 {
        let mut parser = Self {
            src: src.as_bytes(),
            pos: 0,
            time,
        };
        let value = parser.sum();
        assert_eq!(parser.pos, parser.src.len(), "trailing input in {src}");
        value
    }

    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    fn expect(&mut self, byte: u8) {
        assert_eq!(self.peek(), Some(byte), "at {} in {:?}", self.pos, self.text());
        self.pos += 1;
    }

    fn text(&self) -> &str {
        std::str::from_utf8(self.src).unwrap()
    }

    fn sum(&mut self) -> f64 {
        let mut value = self.product();
        loop {
            match self.peek() {
                Some(b'+') => {
                    self.pos += 1;
                    value += self.product();
                }
                Some(b'-') => {
                    self.pos += 1;
                    value -= self.product();
                }
                _ => return value,
            }
        }
    }

    fn product(&mut self) -> f64 {
        let mut value = self.factor();
        loop {
            match self.peek() {
                Some(b'*') => {
                    self.pos += 1;
                    value *= self.factor();
                }
                Some(b'/') => {
                    self.pos += 1;
                    let divisor = self.factor();
                    assert!(divisor != 0.0, "division by zero in {}", self.text());
                    value /= divisor;
                }
                _ => return value,
            }
        }
    }

    fn factor(&mut self) -> f64 {
        match self.peek() {
            Some(b'-') => {
                self.pos += 1;
                -self.factor()
            }
            Some(b'(') => {
                self.pos += 1;
                let value = self.sum();
                self.expect(b')');
                value
            }
            Some(c) if c.is_ascii_digit() => self.number(),
            Some(c) if c.is_ascii_alphabetic() => self.name(),
            other => panic!("unexpected {other:?} at {} in {}", self.pos, self.text()),
        }
    }

    fn number(&mut self) -> f64 {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_digit() || c == b'.') {
            self.pos += 1;
        }
        self.text()[start..self.pos].parse().unwrap()
    }

    fn name(&mut self) -> f64 {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_alphabetic()) {
            self.pos += 1;
        }
        let name = self.text()[start..self.pos].to_string();
        match name.as_str() {
            "t" | "it" => return self.time,
            _ => {}
        }

        self.expect(b'(');
        let mut args = vec![self.sum()];
        while self.peek() == Some(b',') {
            self.pos += 1;
            args.push(self.sum());
        }
        self.expect(b')');

        match (name.as_str(), args.as_slice()) {
            ("if", [cond, then, otherwise]) => {
                if *cond != 0.0 {
                    *then
                } else {
                    *otherwise
                }
            }
            ("lt", [a, b]) => f64::from(u8::from(a < b)),
            ("gte", [a, b]) => f64::from(u8::from(a >= b)),
            ("pow", [a, b]) => a.powf(*b),
            _ => panic!("unknown call {name} with {} args", args.len()),
        }
    }
}

fn fnv1a_64(input: &str) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in input.as_bytes() {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

#[test]
fn product_demo_position_expression() {
    let model = load_fixture("product-demo.json");
    let compiled = compile(&model);

    assert_eq!(model.effects().len(), 2);
    assert_eq!(model.keyframes().len(), 3);
    assert_eq!(
        compiled.offset_x.to_string(),
        "if(lt(t,0),0,if(lt(t,4),0+15*(t/4),if(lt(t,9),15+(-25)*((t-4)/5),-10)))"
    );
}

#[test]
fn product_demo_matches_preview_every_frame() {
    let model = load_fixture("product-demo.json");
    let compiled = compile(&model);

    let fps = 30;
    for frame in 0..=(12 * fps) {
        let t = frame as f64 / fps as f64;
        let preview = compose(&model, t, None);
        let rendered = compiled.evaluate(t);
        assert!((preview.scale - rendered.scale).abs() < 1e-9, "scale at {t}");
        assert!((preview.translate_x_percent - rendered.translate_x_percent).abs() < 1e-9);
        assert!((preview.translate_y_percent - rendered.translate_y_percent).abs() < 1e-9);
        assert_eq!(preview.origin_y_percent, rendered.origin_y_percent, "origin at {t}");
    }
}

#[test]
fn overlapping_fixture_keeps_origin_tie_break() {
    let model = load_fixture("overlapping.json");
    let compiled = compile(&model);

    assert_eq!(model.overlapping_effects().len(), 1);
    for t in [0.5, 1.9, 2.0, 3.0, 3.9, 4.0, 5.5, 7.0] {
        let preview = compose(&model, t, None);
        assert_eq!(compiled.evaluate(t).origin_y_percent, preview.origin_y_percent);
    }
}

#[test]
fn compiled_output_signature_is_stable_across_runs() {
    let signature = |model: &TimelineModel| {
        let compiled = compile(model);
        let rendered = compiled.render(&Dialect::FILTER);
        let json = serde_json::to_string(&rendered).expect("expressions serialize");
        format!("{json}\n{}", compiled.to_zoompan_filter(1920, 1080, 60))
    };

    let first = load_fixture("product-demo.json");
    let second = load_fixture("product-demo.json");
    assert_eq!(fnv1a_64(&signature(&first)), fnv1a_64(&signature(&second)));
    assert_ne!(
        fnv1a_64(&signature(&first)),
        fnv1a_64(&signature(&load_fixture("overlapping.json")))
    );
}

#[test]
fn rendered_strings_match_preview_for_fixtures() {
    for name in ["product-demo.json", "overlapping.json"] {
        let model = load_fixture(name);
        let compiled = compile(&model);
        let rendered = compiled.render(&Dialect::FILTER);
        let scale = rendered.scale.as_deref().expect("fixtures have effects");

        for frame in 0..=(model.effective_duration() * 30.0) as usize {
            let t = frame as f64 / 30.0;
            let preview = compose(&model, t, None);
            let tree = compiled.evaluate(t);
            let x = RenderedEval::eval(&rendered.offset_x, t);
            let y = RenderedEval::eval(&rendered.offset_y, t);
            assert!((x - preview.translate_x_percent).abs() < 1e-9, "{name} x at {t}");
            assert!((y - preview.translate_y_percent).abs() < 1e-9, "{name} y at {t}");

            let s = RenderedEval::eval(scale, t);
            assert!((s - tree.scale).abs() < 1e-9, "{name} scale at {t}");
            let origin_x = RenderedEval::eval(&rendered.origin_x, t);
            let origin_y = RenderedEval::eval(&rendered.origin_y, t);
            assert_eq!(origin_x, tree.origin_x_percent, "{name} origin at {t}");
            assert_eq!(origin_y, tree.origin_y_percent, "{name} origin at {t}");
        }
    }
}

#[test]
fn rendered_strings_survive_near_duplicate_keyframes() {
    let mut model = TimelineModel::new(3.0);
    model.add_keyframe(1.0, 0.0, 0.0);
    model.add_keyframe(1.0000004, 100.0, -40.0);
    model.add_keyframe(2.0 / 3.0, 10.0, 10.0);
    let rendered = compile(&model).render(&Dialect::FILTER);

    for t in [0.0, 2.0 / 3.0, 0.9, 1.0, 1.0000001, 1.0000002, 1.0000004, 2.0] {
        let preview = compose(&model, t, None);
        let x = RenderedEval::eval(&rendered.offset_x, t);
        let y = RenderedEval::eval(&rendered.offset_y, t);
        assert!(x.is_finite() && y.is_finite());
        assert!((x - preview.translate_x_percent).abs() < 1e-6, "x at {t}");
        assert!((y - preview.translate_y_percent).abs() < 1e-6, "y at {t}");
    }
}

#[test]
fn zoompan_scale_string_evaluates_like_the_tree() {
    let model = load_fixture("product-demo.json");
    let compiled = compile(&model);
    let filter = compiled.to_zoompan_filter(1280, 720, 30);
    let scale = filter
        .strip_prefix("zoompan=z='")
        .and_then(|rest| rest.split('\'').next())
        .expect("zoompan filter starts with the scale");

    for frame in 0..=360 {
        let t = frame as f64 / 30.0;
        let from_string = RenderedEval::eval(scale, t);
        assert!((from_string - compiled.evaluate(t).scale).abs() < 1e-9, "at {t}");
    }
}
