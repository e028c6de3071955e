use super::init::DeviceSettings;

/// Picks the surface format for the adapter.
///
/// With `prefer_srgb`, the first sRGB 8-bit BGRA/RGBA format wins; otherwise the
/// surface's own first (preferred) format is used. `None` when the surface
/// reports no formats for this adapter.
pub fn negotiate_format(
    caps: &wgpu::SurfaceCapabilities,
    prefer_srgb: bool,
) -> Option<wgpu::TextureFormat> {
    let first = *caps.formats.first()?;
    if !prefer_srgb {
        return Some(first);
    }
    let srgb = caps.formats.iter().copied().find(|f| {
        matches!(
            f,
            wgpu::TextureFormat::Bgra8UnormSrgb | wgpu::TextureFormat::Rgba8UnormSrgb
        )
    });
    Some(srgb.unwrap_or(first))
}

/// `None` defers to the platform. A request the surface cannot honor degrades
/// to its first listed mode.
pub fn choose_alpha_mode(
    caps: &wgpu::SurfaceCapabilities,
    requested: Option<wgpu::CompositeAlphaMode>,
) -> wgpu::CompositeAlphaMode {
    match requested {
        None => wgpu::CompositeAlphaMode::Auto,
        Some(mode) if caps.alpha_modes.contains(&mode) => mode,
        Some(mode) => {
            let fallback = caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto);
            log::warn!("alpha mode {mode:?} unsupported by surface; using {fallback:?}");
            fallback
        }
    }
}

pub fn choose_present_mode(
    caps: &wgpu::SurfaceCapabilities,
    requested: wgpu::PresentMode,
) -> wgpu::PresentMode {
    if caps.present_modes.contains(&requested) {
        return requested;
    }
    log::warn!("present mode {requested:?} unsupported by surface; using Fifo");
    wgpu::PresentMode::Fifo
}

/// Builds the full surface configuration for a render-target surface.
///
/// Returns `None` when no format can be negotiated.
pub fn build_config(
    caps: &wgpu::SurfaceCapabilities,
    settings: &DeviceSettings,
    width: u32,
    height: u32,
) -> Option<wgpu::SurfaceConfiguration> {
    let format = negotiate_format(caps, settings.prefer_srgb)?;

    Some(wgpu::SurfaceConfiguration {
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        format,
        width: width.max(1),
        height: height.max(1),
        present_mode: choose_present_mode(caps, settings.present_mode),
        alpha_mode: choose_alpha_mode(caps, settings.alpha_mode),
        view_formats: vec![],
        desired_maximum_frame_latency: settings.desired_maximum_frame_latency,
    })
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ResizeOutcome {
    /// Configuration updated; the surface must be reconfigured before the next frame.
    Reconfigure,
    /// Zero-sized drawable (minimized); configuration is deferred.
    Deferred,
    /// Size unchanged.
    Unchanged,
}

/// Applies a new drawable size to `config`.
///
/// A minimized window reports a zero extent, which no surface accepts, so the
/// previous size is kept until a real one arrives.
pub fn apply_resize(
    config: &mut wgpu::SurfaceConfiguration,
    width: u32,
    height: u32,
) -> ResizeOutcome {
    if width == 0 || height == 0 {
        return ResizeOutcome::Deferred;
    }
    if config.width == width && config.height == height {
        return ResizeOutcome::Unchanged;
    }

    config.width = width;
    config.height = height;
    ResizeOutcome::Reconfigure
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caps(formats: &[wgpu::TextureFormat]) -> wgpu::SurfaceCapabilities {
        wgpu::SurfaceCapabilities {
            formats: formats.to_vec(),
            present_modes: vec![wgpu::PresentMode::Fifo, wgpu::PresentMode::Mailbox],
            alpha_modes: vec![wgpu::CompositeAlphaMode::Opaque],
            usages: wgpu::TextureUsages::RENDER_ATTACHMENT,
        }
    }

    #[test]
    fn srgb_preferred_when_available() {
        let c = caps(&[wgpu::TextureFormat::Bgra8Unorm, wgpu::TextureFormat::Bgra8UnormSrgb]);
        assert_eq!(negotiate_format(&c, true), Some(wgpu::TextureFormat::Bgra8UnormSrgb));
        assert_eq!(negotiate_format(&c, false), Some(wgpu::TextureFormat::Bgra8Unorm));
    }

    #[test]
    fn first_format_when_no_srgb() {
        let c = caps(&[wgpu::TextureFormat::Rgba16Float]);
        assert_eq!(negotiate_format(&c, true), Some(wgpu::TextureFormat::Rgba16Float));
    }

    #[test]
    fn srgb_choice_follows_surface_order() {
        let c = caps(&[
            wgpu::TextureFormat::Rgba16Float,
            wgpu::TextureFormat::Rgba8UnormSrgb,
            wgpu::TextureFormat::Bgra8UnormSrgb,
        ]);
        assert_eq!(negotiate_format(&c, true), Some(wgpu::TextureFormat::Rgba8UnormSrgb));
    }

    #[test]
    fn no_formats_no_negotiation() {
        assert_eq!(negotiate_format(&caps(&[]), true), None);
        assert!(build_config(&caps(&[]), &DeviceSettings::default(), 640, 480).is_none());
    }

    #[test]
    fn unsupported_alpha_falls_back_to_first() {
        let c = caps(&[wgpu::TextureFormat::Bgra8Unorm]);
        assert_eq!(
            choose_alpha_mode(&c, Some(wgpu::CompositeAlphaMode::PreMultiplied)),
            wgpu::CompositeAlphaMode::Opaque
        );
        let mut empty = caps(&[wgpu::TextureFormat::Bgra8Unorm]);
        empty.alpha_modes.clear();
        assert_eq!(
            choose_alpha_mode(&empty, Some(wgpu::CompositeAlphaMode::Opaque)),
            wgpu::CompositeAlphaMode::Auto
        );
    }

    #[test]
    fn unrequested_alpha_is_left_to_the_platform() {
        // Opaque is listed, but nothing asked for it.
        let c = caps(&[wgpu::TextureFormat::Bgra8Unorm]);
        assert_eq!(choose_alpha_mode(&c, None), wgpu::CompositeAlphaMode::Auto);
        let config = build_config(&c, &DeviceSettings::default(), 640, 480).unwrap();
        assert_eq!(config.alpha_mode, wgpu::CompositeAlphaMode::Auto);
    }

    #[test]
    fn unsupported_present_mode_falls_back_to_fifo() {
        let c = caps(&[wgpu::TextureFormat::Bgra8Unorm]);
        assert_eq!(
            choose_present_mode(&c, wgpu::PresentMode::Immediate),
            wgpu::PresentMode::Fifo
        );
        assert_eq!(
            choose_present_mode(&c, wgpu::PresentMode::Mailbox),
            wgpu::PresentMode::Mailbox
        );
    }

    #[test]
    fn config_is_render_target_fifo_by_default() {
        let c = caps(&[wgpu::TextureFormat::Bgra8UnormSrgb]);
        let config = build_config(&c, &DeviceSettings::default(), 640, 480).unwrap();
        assert_eq!(config.usage, wgpu::TextureUsages::RENDER_ATTACHMENT);
        assert_eq!(config.present_mode, wgpu::PresentMode::Fifo);
        assert_eq!((config.width, config.height), (640, 480));
    }

    #[test]
    fn resize_updates_or_defers() {
        let c = caps(&[wgpu::TextureFormat::Bgra8UnormSrgb]);
        let mut config = build_config(&c, &DeviceSettings::default(), 640, 480).unwrap();

        assert_eq!(apply_resize(&mut config, 0, 300), ResizeOutcome::Deferred);
        assert_eq!((config.width, config.height), (640, 480));

        assert_eq!(apply_resize(&mut config, 640, 480), ResizeOutcome::Unchanged);

        assert_eq!(apply_resize(&mut config, 800, 600), ResizeOutcome::Reconfigure);
        assert_eq!((config.width, config.height), (800, 600));
    }
}
