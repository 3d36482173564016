//! Baking animations to fixed-rate joint tracks.

use std::collections::HashMap;

use log::warn;

use crate::document::AnimationPath;
use crate::math::{quat_from_array, quat_to_euler_deg};
use crate::scene::{BakedClip, JointTrack};

use super::accessor;
use super::error::ConvertError;
use super::Converter;

impl Converter {
    /// Bake every animation touching the given joints into per-joint
    /// sample tracks.
    ///
    /// The frame count comes from the first channel's time-sample array;
    /// channels with a different sample count are truncated or padded
    /// with their last value to match.
    pub(super) fn bake_clips(
        &mut self,
        joint_nodes: &HashMap<String, String>,
    ) -> Result<Vec<BakedClip>, ConvertError> {
        let mut clips = Vec::new();
        let mut animation_ids: Vec<String> = self.document.animations.keys().cloned().collect();
        animation_ids.sort();

        for animation_id in animation_ids {
            let Some(animation) = self.document.animations.get(&animation_id).cloned() else {
                continue;
            };
            if !animation
                .channels
                .iter()
                .any(|channel| joint_nodes.contains_key(&channel.target.node))
            {
                continue;
            }

            let frames = match animation.channels.first().and_then(|channel| {
                animation
                    .samplers
                    .get(&channel.sampler)
                    .map(|sampler| sampler.input.clone())
            }) {
                Some(input) => accessor::element_count(&self.document, &input)?,
                None => {
                    warn!("animation '{animation_id}' has no usable channels, skipping");
                    continue;
                }
            };

            let mut clip = BakedClip {
                name: animation
                    .name
                    .clone()
                    .unwrap_or_else(|| animation_id.clone()),
                fps: self.frame_rate,
                frames,
                tracks: Vec::new(),
            };

            let mut node_ids: Vec<&String> = joint_nodes.keys().collect();
            node_ids.sort();
            for node_id in node_ids {
                let mut track = JointTrack {
                    joint: joint_nodes[node_id].clone(),
                    ..JointTrack::default()
                };
                for channel in animation
                    .channels
                    .iter()
                    .filter(|channel| &channel.target.node == node_id)
                {
                    let Some(sampler) = animation.samplers.get(&channel.sampler) else {
                        warn!(
                            "animation '{animation_id}' channel targets '{node_id}' through unknown sampler '{}'",
                            channel.sampler
                        );
                        continue;
                    };
                    let output =
                        accessor::decode_floats(&mut self.buffers, &self.document, &sampler.output)?;
                    match channel.target.path {
                        AnimationPath::Translation => {
                            track.translation =
                                Some(align_vec3(&animation_id, output, frames));
                        }
                        AnimationPath::Scale => {
                            track.scale = Some(align_vec3(&animation_id, output, frames));
                        }
                        AnimationPath::Rotation => {
                            track.rotation = Some(align_rotation(&animation_id, output, frames));
                        }
                        AnimationPath::Unknown => {
                            warn!(
                                "animation '{animation_id}' has an unsupported channel path for '{node_id}', skipping"
                            );
                        }
                    }
                }
                let has_samples =
                    track.translation.is_some() || track.rotation.is_some() || track.scale.is_some();
                if has_samples {
                    clip.tracks.push(track);
                }
            }
            clips.push(clip);
        }
        Ok(clips)
    }
}

/// Fit a sample vector to the clip's frame count, truncating extra frames
/// and holding the last value over missing ones.
fn align<T: Copy>(animation_id: &str, mut samples: Vec<T>, frames: usize) -> Vec<T> {
    if samples.len() != frames {
        warn!(
            "animation '{animation_id}' channel has {} samples for {frames} frames, adjusting",
            samples.len()
        );
    }
    samples.truncate(frames);
    if let Some(&last) = samples.last() {
        while samples.len() < frames {
            samples.push(last);
        }
    }
    samples
}

fn align_vec3(animation_id: &str, output: Vec<f32>, frames: usize) -> Vec<[f32; 3]> {
    let samples: Vec<[f32; 3]> = output
        .chunks_exact(3)
        .map(|chunk| [chunk[0], chunk[1], chunk[2]])
        .collect();
    align(animation_id, samples, frames)
}

/// Convert sampled quaternions to Euler angles in degrees, frame by frame.
fn align_rotation(animation_id: &str, output: Vec<f32>, frames: usize) -> Vec<[f32; 3]> {
    let samples: Vec<[f32; 3]> = output
        .chunks_exact(4)
        .map(|chunk| quat_to_euler_deg(quat_from_array([chunk[0], chunk[1], chunk[2], chunk[3]])))
        .collect();
    align(animation_id, samples, frames)
}
