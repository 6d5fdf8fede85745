//! Canvas 2D renderer (web build)
//!
//! Draws the whole frame from `GameState` each animation frame. The sim
//! never sees any of this; everything here is read-only over the state.
//!
//! The glyph atlas is a monochrome white tilesheet, so tinting works by
//! stamping the tile into a small scratch canvas and compositing a color
//! fill with `source-atop`. Tinted tiles are cached per (tile, tint) pair.

use std::collections::HashMap;

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement};

use crate::consts::TILE_SIZE;
use crate::sim::{FragmentVisual, GameState, Rune, RuneFace};
use crate::text::GlyphSprite;

const TILEMAP_SRC: &str = "/art/monochrome-transparent_packed.png";
const RUNE_NEUTRAL_SRC: &str = "/art/runeBlack_slabOutline_035.png";
const RUNE_CORRECT_SRC: &str = "/art/runeBlue_slabOutline_035.png";
const RUNE_INCORRECT_SRC: &str = "/art/runeGrey_slabOutline_036.png";

const BACKGROUND: &str = "#101018";

pub struct Renderer {
    ctx: CanvasRenderingContext2d,
    tilemap: HtmlImageElement,
    rune_neutral: HtmlImageElement,
    rune_correct: HtmlImageElement,
    rune_incorrect: HtmlImageElement,
    /// Pre-tinted glyph tiles, keyed by (tile, tint)
    tint_cache: HashMap<(u16, u32), HtmlCanvasElement>,
}

fn load_image(src: &str) -> Result<HtmlImageElement, JsValue> {
    let image = HtmlImageElement::new()?;
    image.set_src(src);
    Ok(image)
}

fn css_color(tint: u32) -> String {
    format!("#{:06x}", tint & 0xffffff)
}

impl Renderer {
    pub fn new(canvas: &HtmlCanvasElement) -> Result<Self, JsValue> {
        let ctx: CanvasRenderingContext2d = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("no 2d context"))?
            .dyn_into()?;
        // Pixel-art atlas, keep it crisp
        ctx.set_image_smoothing_enabled(false);

        Ok(Self {
            ctx,
            tilemap: load_image(TILEMAP_SRC)?,
            rune_neutral: load_image(RUNE_NEUTRAL_SRC)?,
            rune_correct: load_image(RUNE_CORRECT_SRC)?,
            rune_incorrect: load_image(RUNE_INCORRECT_SRC)?,
            tint_cache: HashMap::new(),
        })
    }

    fn ready(&self) -> bool {
        self.tilemap.complete()
            && self.rune_neutral.complete()
            && self.rune_correct.complete()
            && self.rune_incorrect.complete()
    }

    fn face_image(&self, face: RuneFace) -> &HtmlImageElement {
        match face {
            RuneFace::Neutral => &self.rune_neutral,
            RuneFace::Correct => &self.rune_correct,
            RuneFace::Incorrect => &self.rune_incorrect,
        }
    }

    /// Tile stamped white-on-transparent, recolored via source-atop
    fn tinted_tile(&mut self, tile: u16, tint: u32) -> Result<HtmlCanvasElement, JsValue> {
        if let Some(cached) = self.tint_cache.get(&(tile, tint)) {
            return Ok(cached.clone());
        }

        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| JsValue::from_str("no document"))?;
        let scratch: HtmlCanvasElement = document.create_element("canvas")?.dyn_into()?;
        scratch.set_width(TILE_SIZE as u32);
        scratch.set_height(TILE_SIZE as u32);

        let sctx: CanvasRenderingContext2d = scratch
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("no 2d context"))?
            .dyn_into()?;
        sctx.set_image_smoothing_enabled(false);

        let sprite = GlyphSprite {
            tile,
            pos: glam::Vec2::ZERO,
            scale: 1.0,
            tint,
        };
        let (fx, fy, fw, fh) = sprite.frame();
        sctx.draw_image_with_html_image_element_and_sw_and_sh_and_dx_and_dy_and_dw_and_dh(
            &self.tilemap,
            fx as f64,
            fy as f64,
            fw as f64,
            fh as f64,
            0.0,
            0.0,
            TILE_SIZE as f64,
            TILE_SIZE as f64,
        )?;
        sctx.set_global_composite_operation("source-atop")?;
        sctx.set_fill_style_str(&css_color(tint));
        sctx.fill_rect(0.0, 0.0, TILE_SIZE as f64, TILE_SIZE as f64);

        self.tint_cache.insert((tile, tint), scratch.clone());
        Ok(scratch)
    }

    fn draw_glyph(&mut self, glyph: &GlyphSprite) -> Result<(), JsValue> {
        let tinted = self.tinted_tile(glyph.tile, glyph.tint)?;
        let size = glyph.size() as f64;
        self.ctx.draw_image_with_html_canvas_element_and_dw_and_dh(
            &tinted,
            glyph.pos.x as f64,
            glyph.pos.y as f64,
            size,
            size,
        )
    }

    fn draw_glyphs(&mut self, glyphs: &[GlyphSprite]) -> Result<(), JsValue> {
        for glyph in glyphs {
            self.draw_glyph(glyph)?;
        }
        Ok(())
    }

    fn draw_rune(&mut self, rune: &Rune) -> Result<(), JsValue> {
        let half = rune.half_extent() as f64;
        let image = self.face_image(rune.face).clone();
        self.ctx.draw_image_with_html_image_element_and_dw_and_dh(
            &image,
            rune.pos.x as f64 - half,
            rune.pos.y as f64 - half,
            half * 2.0,
            half * 2.0,
        )?;
        self.draw_glyphs(&rune.glyphs)
    }

    fn draw_fragments(&mut self, state: &GameState) -> Result<(), JsValue> {
        for fragment in &state.fragments {
            let body = &fragment.body;
            self.ctx.save();
            self.ctx.translate(body.pos.x as f64, body.pos.y as f64)?;
            self.ctx.rotate(body.angle as f64)?;

            match fragment.visual {
                FragmentVisual::RunePiece { face, frame, scale } => {
                    let (fx, fy, fw, fh) = frame;
                    // Frame coords are in slab texture space; the slab images
                    // ship at RUNE_TEX_SIZE so no remap is needed.
                    let image = self.face_image(face).clone();
                    let dw = (fw * scale) as f64;
                    let dh = (fh * scale) as f64;
                    self.ctx
                        .draw_image_with_html_image_element_and_sw_and_sh_and_dx_and_dy_and_dw_and_dh(
                            &image,
                            fx as f64,
                            fy as f64,
                            fw as f64,
                            fh as f64,
                            -dw / 2.0,
                            -dh / 2.0,
                            dw,
                            dh,
                        )?;
                }
                FragmentVisual::Glyph { tile, tint, size } => {
                    let tinted = self.tinted_tile(tile, tint)?;
                    let size = size as f64;
                    self.ctx.draw_image_with_html_canvas_element_and_dw_and_dh(
                        &tinted,
                        -size / 2.0,
                        -size / 2.0,
                        size,
                        size,
                    )?;
                }
            }
            self.ctx.restore();
        }
        Ok(())
    }

    /// Draw one full frame
    pub fn render(&mut self, state: &GameState) -> Result<(), JsValue> {
        let w = state.viewport.x as f64;
        let h = state.viewport.y as f64;

        self.ctx.set_fill_style_str(BACKGROUND);
        self.ctx.fill_rect(0.0, 0.0, w, h);

        if !self.ready() {
            return Ok(());
        }

        // Play field shakes as one layer; HUD text stays put
        self.ctx.save();
        self.ctx
            .translate(state.shake_offset.x as f64, state.shake_offset.y as f64)?;

        self.draw_fragments(state)?;
        for fallen in &state.fallen {
            self.draw_rune(&fallen.rune)?;
        }
        for rune in &state.runes {
            self.draw_rune(rune)?;
        }
        self.draw_glyphs(&state.factor_glyphs)?;

        self.ctx.restore();

        self.draw_glyphs(&state.title_glyphs)?;
        self.draw_glyphs(&state.ui_glyphs)?;
        self.draw_glyphs(&state.over_glyphs)?;

        Ok(())
    }
}
