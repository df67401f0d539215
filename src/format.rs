pub const SHORTS_WIDTH: u32 = 1080;
pub const SHORTS_HEIGHT: u32 = 1920;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn ratio(&self) -> f64 {
        self.width as f64 / self.height as f64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CropAxis {
    /// Source is wider than the target: columns are cut on both sides.
    Horizontal,
    /// Source is as narrow or narrower than the target: rows are cut.
    Vertical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropWindow {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropPlan {
    pub axis: CropAxis,
    pub window: CropWindow,
    pub canvas: Dimensions,
}

/// Portrait output format. Sources are center-cropped to the canvas ratio
/// and centered on a black canvas at their native size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShortsFormat {
    pub canvas: Dimensions,
}

impl Default for ShortsFormat {
    fn default() -> Self {
        Self {
            canvas: Dimensions::new(SHORTS_WIDTH, SHORTS_HEIGHT),
        }
    }
}

impl ShortsFormat {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            canvas: Dimensions::new(width, height),
        }
    }

    pub fn plan(&self, source: Dimensions) -> CropPlan {
        let target_ratio = self.canvas.ratio();
        let current_ratio = source.ratio();

        let (axis, window) = if current_ratio > target_ratio {
            let new_width =
                ((source.height as f64 * target_ratio).round() as u32).min(source.width);
            let x = (source.width - new_width) / 2;
            (
                CropAxis::Horizontal,
                CropWindow {
                    x,
                    y: 0,
                    width: new_width,
                    height: source.height,
                },
            )
        } else {
            let new_height =
                ((source.width as f64 / target_ratio).round() as u32).min(source.height);
            let y = (source.height - new_height) / 2;
            (
                CropAxis::Vertical,
                CropWindow {
                    x: 0,
                    y,
                    width: source.width,
                    height: new_height,
                },
            )
        };

        CropPlan {
            axis,
            window,
            canvas: self.canvas,
        }
    }
}

impl CropPlan {
    /// Part of the crop window that lands on the canvas. A window larger
    /// than the canvas loses its overflow evenly on both sides; nothing is
    /// rescaled.
    pub fn visible(&self) -> CropWindow {
        let width = self.window.width.min(self.canvas.width);
        let height = self.window.height.min(self.canvas.height);
        CropWindow {
            x: self.window.x + (self.window.width - width) / 2,
            y: self.window.y + (self.window.height - height) / 2,
            width,
            height,
        }
    }

    /// Top-left corner of the visible picture on the canvas.
    pub fn offset(&self) -> (u32, u32) {
        let visible = self.visible();
        (
            (self.canvas.width - visible.width) / 2,
            (self.canvas.height - visible.height) / 2,
        )
    }

    pub fn output(&self) -> Dimensions {
        self.canvas
    }

    /// ffmpeg filter chain implementing the plan: one crop to the visible
    /// region, then a black pad out to the canvas.
    pub fn filter(&self) -> String {
        let visible = self.visible();
        let (x, y) = self.offset();
        format!(
            "crop={}:{}:{}:{},pad={}:{}:{}:{}:color=black,setsar=1",
            visible.width,
            visible.height,
            visible.x,
            visible.y,
            self.canvas.width,
            self.canvas.height,
            x,
            y
        )
    }
}
