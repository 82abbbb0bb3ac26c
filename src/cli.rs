use argh::FromArgs;

/// Camera-based abnormal region scanner
#[derive(FromArgs, Debug)]
pub struct Args {
    /// frame source: /dev/videoN, stub://<name>, an image file or an image folder
    #[argh(option, default = "String::from(\"/dev/video0\")")]
    pub source: String,

    /// requested capture width in pixels
    #[argh(option, default = "640")]
    pub width: u32,

    /// requested capture height in pixels
    #[argh(option, default = "480")]
    pub height: u32,

    /// file the detection report is appended to
    #[argh(option, default = "String::from(\"tumor_detection_report.txt\")")]
    pub report: String,

    /// speech synthesizer executable
    #[argh(option, default = "String::from(\"espeak-ng\")")]
    pub speech_program: String,

    /// index of the installed voice used for narration
    #[argh(option, default = "1")]
    pub voice_index: usize,

    /// delay before each narration starts, in seconds
    #[argh(option, default = "1.2")]
    pub narration_delay: f32,

    /// truetype font used for captions instead of the bundled one
    #[argh(option)]
    pub font: Option<String>,

    /// binary threshold cutoff applied after blurring
    #[argh(option, default = "150")]
    pub threshold: u8,

    /// minimum contour area in pixels
    #[argh(option, default = "1000.0")]
    pub min_area: f64,

    /// analyze an image or image folder without the live feed
    #[argh(option)]
    pub still: Option<String>,

    /// folder annotated frames are written to in still mode
    #[argh(option, default = "String::from(\"./runs\")")]
    pub output_dir: String,
}
