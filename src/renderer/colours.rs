use image::Rgba;

pub(crate) struct Colours {
    pub background: Rgba<u8>,
    pub panel: Rgba<u8>,
    pub header: Rgba<u8>,
    pub text: Rgba<u8>,
    pub muted: Rgba<u8>,
    pub grid: Rgba<u8>,
    pub stale: Rgba<u8>,
    pub tvoc: Rgba<u8>,
    pub eco2: Rgba<u8>,
    pub temperature: Rgba<u8>,
    pub humidity: Rgba<u8>,
}

impl Default for Colours {
    fn default() -> Self {
        Self {
            background: Rgba([0, 0, 0, 255]),
            panel: Rgba([24, 26, 32, 255]),       // Charcoal - map backdrop
            header: Rgba([114, 159, 207, 255]),   // Steel blue - for headers
            text: Rgba([238, 238, 236, 255]),     // Off-white - for general text
            muted: Rgba([186, 189, 182, 255]),    // Silver gray - labels, empty states
            grid: Rgba([45, 48, 58, 255]),
            stale: Rgba([245, 121, 0, 255]),      // Burnt orange - stale detail marker
            tvoc: Rgba([102, 126, 234, 255]),
            eco2: Rgba([118, 75, 162, 255]),
            temperature: Rgba([255, 99, 132, 255]),
            humidity: Rgba([54, 162, 235, 255]),
        }
    }
}
