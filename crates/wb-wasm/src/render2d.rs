//! Canvas2D software renderer.
//!
//! Draws a board to an HTML `<canvas>` via `CanvasRenderingContext2d`.
//! Geometry is mapped to screen space through the board camera up front,
//! so line widths and text stay crisp at every zoom level.

use wb_core::{BackgroundFrame, BackgroundMode, Bounds, Camera, LineStyle, Node, Point};
use wb_editor::Board;
use wb_render::{PathVariant, RoutedConnection};
use web_sys::CanvasRenderingContext2d;

const ACCENT: &str = "#3B82F6";
const FLOW: &str = "#F59E0B";
const GRID_SPACING: f64 = 24.0;

/// Theme-dependent colors for the canvas renderer.
pub struct CanvasTheme {
    pub bg: &'static str,
    pub grid: &'static str,
    pub node_bg: &'static str,
    pub node_border: &'static str,
    pub text: &'static str,
    pub connection: &'static str,
}

impl CanvasTheme {
    pub fn light() -> Self {
        Self {
            bg: "#F8FAFC",
            grid: "rgba(15, 23, 42, 0.12)",
            node_bg: "#FFFFFF",
            node_border: "#CBD5E1",
            text: "#0F172A",
            connection: "#64748B",
        }
    }

    pub fn dark() -> Self {
        Self {
            bg: "#0F172A",
            grid: "rgba(248, 250, 252, 0.08)",
            node_bg: "#1E293B",
            node_border: "#475569",
            text: "#F1F5F9",
            connection: "#94A3B8",
        }
    }
}

/// Per-frame overlays owned by the interaction layer.
#[derive(Debug, Clone, Copy, Default)]
pub struct Overlays {
    /// Rubber line of a connection being drawn, in world space.
    pub draft: Option<(Point, Point)>,
}

/// Render the whole board to a Canvas2D context.
pub fn render_board(
    ctx: &CanvasRenderingContext2d,
    board: &Board,
    canvas_width: f64,
    canvas_height: f64,
    theme: &CanvasTheme,
    overlays: Overlays,
) {
    let state = board.state();
    let camera = board.camera();

    ctx.set_fill_style_str(theme.bg);
    ctx.fill_rect(0.0, 0.0, canvas_width, canvas_height);
    if let Some(color) = state.view.background_color {
        ctx.set_fill_style_str(&color.to_hex());
        ctx.fill_rect(0.0, 0.0, canvas_width, canvas_height);
    }
    if state.view.show_grid {
        draw_grid(ctx, &camera, state.view.background_mode, canvas_width, canvas_height, theme);
    }

    for frame in &state.frames {
        draw_frame(ctx, &camera, frame, board.selection().has_frame(frame.id), theme);
    }

    let flow = board.flow_highlight();
    for routed in board.routes(PathVariant::Standard) {
        let Some(conn) = state.connections.get(routed.index) else {
            continue;
        };
        let color = if conn.selected {
            ACCENT.to_string()
        } else if flow.contains(&routed.key) {
            FLOW.to_string()
        } else {
            conn.color
                .map(|c| c.to_hex())
                .unwrap_or_else(|| theme.connection.to_string())
        };
        draw_connection(ctx, &camera, &routed, &color, conn.style, conn.label.as_deref());
        if conn.selected {
            draw_endpoint_handles(ctx, &camera, &routed);
        }
    }

    let visible = move || state.nodes.iter().filter(move |n| !state.is_hidden(n));
    for node in visible().filter(|n| !n.pinned) {
        let b = camera.world_bounds_to_screen(&node.bounds());
        draw_node(ctx, &b, node, board.selection().has_node(node.id), theme);
    }
    for node in visible().filter(|n| n.pinned) {
        let b = node.screen_bounds(&camera);
        draw_node(ctx, &b, node, board.selection().has_node(node.id), theme);
    }

    if let Some((from, to)) = overlays.draft {
        draw_draft_line(ctx, camera.world_to_screen(from), camera.world_to_screen(to));
    }
    if let Some(marquee) = board.marquee() {
        draw_marquee_rect(ctx, &camera.world_bounds_to_screen(&marquee.rect()));
    }
}

// ─── Background ─────────────────────────────────────────────────────────

fn draw_grid(
    ctx: &CanvasRenderingContext2d,
    camera: &Camera,
    mode: BackgroundMode,
    width: f64,
    height: f64,
    theme: &CanvasTheme,
) {
    let spacing = GRID_SPACING * camera.scale as f64;
    if spacing < 4.0 {
        return;
    }
    // First grid line at or before the left/top edge of the canvas.
    let x0 = (camera.pan_x as f64).rem_euclid(spacing);
    let y0 = (camera.pan_y as f64).rem_euclid(spacing);

    match mode {
        BackgroundMode::Dots => {
            ctx.set_fill_style_str(theme.grid);
            let mut x = x0;
            while x < width {
                let mut y = y0;
                while y < height {
                    ctx.fill_rect(x, y, 1.5, 1.5);
                    y += spacing;
                }
                x += spacing;
            }
        }
        BackgroundMode::Grid => {
            ctx.save();
            ctx.set_stroke_style_str(theme.grid);
            ctx.set_line_width(1.0);
            ctx.begin_path();
            let mut x = x0;
            while x < width {
                ctx.move_to(x, 0.0);
                ctx.line_to(x, height);
                x += spacing;
            }
            let mut y = y0;
            while y < height {
                ctx.move_to(0.0, y);
                ctx.line_to(width, y);
                y += spacing;
            }
            ctx.stroke();
            ctx.restore();
        }
        // The image itself is drawn by the host page.
        BackgroundMode::Plain | BackgroundMode::Image => {}
    }
}

// ─── Entities ───────────────────────────────────────────────────────────

fn draw_frame(
    ctx: &CanvasRenderingContext2d,
    camera: &Camera,
    frame: &BackgroundFrame,
    is_selected: bool,
    theme: &CanvasTheme,
) {
    let style = &frame.style;
    let scale = camera.scale as f64;
    ctx.save();

    if frame.collapsed {
        let b = camera.world_bounds_to_screen(&frame.pill_bounds());
        let (x, y, w, h) = split(&b);
        rounded_rect_path(ctx, x, y, w, h, h / 2.0);
        ctx.set_fill_style_str(theme.node_bg);
        ctx.fill();
        ctx.set_stroke_style_str(&style.border_color.to_hex());
        ctx.set_line_width(if is_selected { 2.0 } else { 1.0 });
        ctx.stroke();

        ctx.set_font("500 13px Inter, system-ui, sans-serif");
        ctx.set_fill_style_str(theme.text);
        ctx.set_text_align("center");
        ctx.set_text_baseline("middle");
        let title = if frame.title.is_empty() { "Frame" } else { frame.title.as_str() };
        let _ = ctx.fill_text(title, x + w / 2.0, y + h / 2.0);
        ctx.restore();
        return;
    }

    let b = camera.world_bounds_to_screen(&frame.bounds());
    let (x, y, w, h) = split(&b);
    let radius = style.border_radius as f64 * scale;
    rounded_rect_path(ctx, x, y, w, h, radius);
    ctx.set_fill_style_str(&style.background_color.to_hex());
    ctx.fill();
    if is_selected {
        ctx.set_stroke_style_str(ACCENT);
        ctx.set_line_width(style.border_width as f64 + 1.0);
    } else {
        ctx.set_stroke_style_str(&style.border_color.to_hex());
        ctx.set_line_width(style.border_width as f64);
    }
    ctx.stroke();

    if !frame.title.is_empty() {
        ctx.set_font("600 12px Inter, system-ui, sans-serif");
        ctx.set_fill_style_str(theme.text);
        ctx.set_text_align("left");
        ctx.set_text_baseline("bottom");
        let _ = ctx.fill_text(&frame.title, x + 4.0, y - 6.0);
    }

    if is_selected {
        draw_selection_handles(ctx, &b);
    }
    ctx.restore();
}

fn draw_node(
    ctx: &CanvasRenderingContext2d,
    b: &Bounds,
    node: &Node,
    is_selected: bool,
    theme: &CanvasTheme,
) {
    let (x, y, w, h) = split(b);
    ctx.save();

    rounded_rect_path(ctx, x, y, w, h, 8.0);
    let fill = node.color.map(|c| c.to_hex());
    ctx.set_fill_style_str(fill.as_deref().unwrap_or(theme.node_bg));
    ctx.fill();
    ctx.set_stroke_style_str(theme.node_border);
    ctx.set_line_width(1.0);
    ctx.stroke();

    if is_selected {
        ctx.set_stroke_style_str(ACCENT);
        ctx.set_line_width(2.0);
        rounded_rect_path(ctx, x - 1.0, y - 1.0, w + 2.0, h + 2.0, 9.0);
        ctx.stroke();
    }

    if let Some(line) = preview_line(&node.content) {
        ctx.set_font("400 14px Inter, system-ui, sans-serif");
        ctx.set_fill_style_str(theme.text);
        ctx.set_text_align("left");
        ctx.set_text_baseline("top");
        let _ = ctx.fill_text_with_max_width(&line, x + 12.0, y + 12.0, (w - 24.0).max(0.0));
    }

    if node.pinned {
        ctx.set_fill_style_str(ACCENT);
        ctx.begin_path();
        let _ = ctx.arc(x + w - 10.0, y + 10.0, 4.0, 0.0, std::f64::consts::TAU);
        ctx.fill();
    }
    ctx.restore();
}

fn draw_connection(
    ctx: &CanvasRenderingContext2d,
    camera: &Camera,
    routed: &RoutedConnection,
    color: &str,
    style: LineStyle,
    label: Option<&str>,
) {
    let to_screen = |p: kurbo::Point| camera.world_to_screen(Point::new(p.x as f32, p.y as f32));
    let [p0, p1, p2, p3] = [
        to_screen(routed.curve.p0),
        to_screen(routed.curve.p1),
        to_screen(routed.curve.p2),
        to_screen(routed.curve.p3),
    ];

    ctx.save();
    ctx.set_stroke_style_str(color);
    ctx.set_line_width(2.0);
    ctx.set_line_cap("round");
    if style == LineStyle::Dashed {
        let _ = ctx.set_line_dash(&js_sys::Array::of2(
            &wasm_bindgen::JsValue::from_f64(8.0),
            &wasm_bindgen::JsValue::from_f64(6.0),
        ));
    }
    ctx.begin_path();
    ctx.move_to(p0.x as f64, p0.y as f64);
    ctx.bezier_curve_to(
        p1.x as f64,
        p1.y as f64,
        p2.x as f64,
        p2.y as f64,
        p3.x as f64,
        p3.y as f64,
    );
    ctx.stroke();
    let _ = ctx.set_line_dash(&js_sys::Array::new());

    let [tip, left, right] = routed.arrow.map(to_screen);
    draw_arrowhead(ctx, tip, left, right, color);

    if let Some(label) = label {
        let at = to_screen(routed.label_pos);
        ctx.set_font("11px Inter, system-ui, sans-serif");
        ctx.set_fill_style_str(color);
        ctx.set_text_align("center");
        ctx.set_text_baseline("bottom");
        let _ = ctx.fill_text(label, at.x as f64, at.y as f64 - 6.0);
    }
    ctx.restore();
}

// ─── Overlays ───────────────────────────────────────────────────────────

fn draw_arrowhead(
    ctx: &CanvasRenderingContext2d,
    tip: Point,
    left: Point,
    right: Point,
    color: &str,
) {
    ctx.save();
    ctx.set_fill_style_str(color);
    ctx.begin_path();
    ctx.move_to(tip.x as f64, tip.y as f64);
    ctx.line_to(left.x as f64, left.y as f64);
    ctx.line_to(right.x as f64, right.y as f64);
    ctx.close_path();
    ctx.fill();
    ctx.restore();
}

fn draw_endpoint_handles(
    ctx: &CanvasRenderingContext2d,
    camera: &Camera,
    routed: &RoutedConnection,
) {
    ctx.save();
    ctx.set_fill_style_str("#FFFFFF");
    ctx.set_stroke_style_str(ACCENT);
    ctx.set_line_width(1.5);
    for p in [routed.curve.p0, routed.curve.p3] {
        let s = camera.world_to_screen(Point::new(p.x as f32, p.y as f32));
        ctx.begin_path();
        let _ = ctx.arc(s.x as f64, s.y as f64, 5.0, 0.0, std::f64::consts::TAU);
        ctx.fill();
        ctx.stroke();
    }
    ctx.restore();
}

fn draw_selection_handles(ctx: &CanvasRenderingContext2d, b: &Bounds) {
    let (x, y, w, h) = split(b);
    let handle_size = 8.0;
    let half = handle_size / 2.0;

    ctx.set_fill_style_str("#FFFFFF");
    ctx.set_stroke_style_str(ACCENT);
    ctx.set_line_width(1.5);

    let corners = [
        (x - half, y - half),
        (x + w - half, y - half),
        (x - half, y + h - half),
        (x + w - half, y + h - half),
    ];
    for (hx, hy) in corners {
        ctx.fill_rect(hx, hy, handle_size, handle_size);
        ctx.stroke_rect(hx, hy, handle_size, handle_size);
    }
}

fn draw_draft_line(ctx: &CanvasRenderingContext2d, from: Point, to: Point) {
    ctx.save();
    ctx.set_stroke_style_str(ACCENT);
    ctx.set_line_width(2.0);
    let _ = ctx.set_line_dash(&js_sys::Array::of2(
        &wasm_bindgen::JsValue::from_f64(6.0),
        &wasm_bindgen::JsValue::from_f64(4.0),
    ));
    ctx.begin_path();
    ctx.move_to(from.x as f64, from.y as f64);
    ctx.line_to(to.x as f64, to.y as f64);
    ctx.stroke();
    ctx.restore();
}

/// Draw the marquee (rubber-band) selection rectangle.
fn draw_marquee_rect(ctx: &CanvasRenderingContext2d, b: &Bounds) {
    let (x, y, w, h) = split(b);
    if w < 1.0 && h < 1.0 {
        return;
    }

    ctx.save();
    ctx.set_fill_style_str("rgba(59, 130, 246, 0.08)");
    ctx.fill_rect(x, y, w, h);

    ctx.set_stroke_style_str(ACCENT);
    ctx.set_line_width(1.0);
    let _ = ctx.set_line_dash(&js_sys::Array::of2(
        &wasm_bindgen::JsValue::from_f64(4.0),
        &wasm_bindgen::JsValue::from_f64(4.0),
    ));
    ctx.stroke_rect(x, y, w, h);
    ctx.restore();
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn rounded_rect_path(ctx: &CanvasRenderingContext2d, x: f64, y: f64, w: f64, h: f64, r: f64) {
    let r = r.min(w / 2.0).min(h / 2.0).max(0.0);
    ctx.begin_path();
    ctx.move_to(x + r, y);
    ctx.line_to(x + w - r, y);
    ctx.arc_to(x + w, y, x + w, y + r, r).unwrap_or(());
    ctx.line_to(x + w, y + h - r);
    ctx.arc_to(x + w, y + h, x + w - r, y + h, r).unwrap_or(());
    ctx.line_to(x + r, y + h);
    ctx.arc_to(x, y + h, x, y + h - r, r).unwrap_or(());
    ctx.line_to(x, y + r);
    ctx.arc_to(x, y, x + r, y, r).unwrap_or(());
    ctx.close_path();
}

fn split(b: &Bounds) -> (f64, f64, f64, f64) {
    (b.x as f64, b.y as f64, b.width as f64, b.height as f64)
}

/// First non-empty line of a node's content, markup tags removed and
/// whitespace collapsed.
fn preview_line(content: &str) -> Option<String> {
    let mut text = String::with_capacity(content.len());
    let mut in_tag = false;
    for ch in content.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => {
                in_tag = false;
                text.push(' ');
            }
            _ if !in_tag => text.push(ch),
            _ => {}
        }
    }
    text.lines()
        .map(|l| l.split_whitespace().collect::<Vec<_>>().join(" "))
        .find(|l| !l.is_empty())
}
