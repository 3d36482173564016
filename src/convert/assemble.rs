//! Scene graph assembly.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use log::warn;

use crate::document::{CollisionShapeDef, CollisionShapeType, Node, RigidBody, Scene};
use crate::scene::{
    Attachment, CollisionBody, CollisionShape, NodeHandle, SceneNode,
};

use super::Converter;

impl Converter {
    /// Assemble one scene into a fresh root node.
    ///
    /// Nodes are shared with the retained node map unless the scene hides
    /// them independently, in which case a copy is attached instead.
    /// Dangling references are logged and skipped; the assembler never
    /// aborts a scene.
    pub(super) fn assemble_scene(&mut self, scene_id: &str) -> NodeHandle {
        let Some(scene) = self.document.scenes.get(scene_id).cloned() else {
            return SceneNode::new(scene_id).into_handle();
        };
        let name = scene.name.clone().unwrap_or_else(|| scene_id.to_string());
        let root = SceneNode::new(name).into_handle();

        let mut visited = HashSet::new();
        for node_id in &scene.nodes {
            self.attach_node(&root, node_id, &scene, &mut visited, false);
        }
        // Legacy documents list hidden nodes only in the extras, not under
        // the scene's roots.
        for node_id in &scene.extras.hidden_nodes {
            if !visited.contains(node_id) && self.document.nodes.contains_key(node_id) {
                self.attach_node(&root, node_id, &scene, &mut visited, false);
            }
        }

        for node_id in &scene.extras.hidden_nodes {
            if let Some(handle) = self.node_paths.get(node_id) {
                set_visible_recursive(handle, false);
            }
        }
        root
    }

    fn attach_node(
        &mut self,
        parent: &NodeHandle,
        node_id: &str,
        scene: &Scene,
        visited: &mut HashSet<String>,
        copied: bool,
    ) {
        if !visited.insert(node_id.to_string()) {
            warn!("scene graph revisits node '{node_id}', cycle broken");
            return;
        }
        let Some(def) = self.document.nodes.get(node_id).cloned() else {
            warn!("scene references unknown node '{node_id}', skipping");
            return;
        };
        let Some(retained) = self.nodes.get(node_id).cloned() else {
            warn!("node '{node_id}' was never built, skipping");
            return;
        };

        // A node the scene hides independently gets a scene-local copy,
        // and so does everything beneath it, so the visibility override
        // never touches handles other scenes display.
        let copy = copied || scene.extras.hidden_nodes.iter().any(|id| id == node_id);
        let handle = if copy {
            retained.borrow().clone().into_handle()
        } else {
            retained
        };
        {
            let mut node = handle.borrow_mut();
            node.children.clear();
            node.attachment = Attachment::None;
            node.visible = true;
            node.reverse_culling = false;
        }
        parent.borrow_mut().children.push(Rc::clone(&handle));
        self.node_paths
            .insert(node_id.to_string(), Rc::clone(&handle));

        self.attach_meshes(&handle, node_id, &def);
        self.attach_camera(&handle, node_id, &def);
        self.attach_light(&handle, node_id, &def);
        if let Some(physics) = &def.extensions.physics {
            self.attach_collision(&handle, node_id, physics);
        }

        for child_id in &def.children {
            self.attach_node(&handle, child_id, scene, visited, copy);
        }

        // Mirroring flips triangle winding; wrap mesh-bearing subtrees so
        // backface culling stays correct.
        if an_odd_number_of_negative_components(def.local_scale()) {
            let mut node = handle.borrow_mut();
            for child in node.children.iter_mut() {
                if !child.borrow().subtree_has_mesh() {
                    continue;
                }
                let mut wrapper = SceneNode::new(format!("{node_id}-reverse-culling"));
                wrapper.reverse_culling = true;
                wrapper.children.push(Rc::clone(child));
                *child = wrapper.into_handle();
            }
        }
    }

    fn attach_meshes(&mut self, parent: &NodeHandle, node_id: &str, def: &Node) {
        if def.meshes.is_empty() {
            return;
        }
        // Skinned meshes nest under their skeleton's node.
        let mesh_parent = match def.skin.as_deref().and_then(|s| self.characters.get(s)) {
            Some(character) => {
                let mut node = SceneNode::new(character.borrow().name.clone());
                node.attachment = Attachment::Skeleton(Rc::clone(character));
                let handle = node.into_handle();
                parent.borrow_mut().children.push(Rc::clone(&handle));
                handle
            }
            None => Rc::clone(parent),
        };
        for mesh_id in &def.meshes {
            let Some(mesh) = self.meshes.get(mesh_id) else {
                warn!("node '{node_id}' references unknown mesh '{mesh_id}', skipping");
                continue;
            };
            let mut node = SceneNode::new(mesh_id.clone());
            node.attachment = Attachment::Mesh(Rc::clone(mesh));
            mesh_parent.borrow_mut().children.push(node.into_handle());
        }
    }

    fn attach_camera(&mut self, parent: &NodeHandle, node_id: &str, def: &Node) {
        let Some(camera_id) = def.camera.as_deref() else {
            return;
        };
        let Some(camera) = self.cameras.get(camera_id) else {
            warn!("node '{node_id}' references unknown camera '{camera_id}', skipping");
            return;
        };
        let mut node = SceneNode::new(camera_id);
        node.attachment = Attachment::Camera(Rc::clone(camera));
        parent.borrow_mut().children.push(node.into_handle());
    }

    fn attach_light(&mut self, parent: &NodeHandle, node_id: &str, def: &Node) {
        let Some(light_ref) = &def.extensions.light else {
            return;
        };
        let Some(light) = self.lights.get(&light_ref.light) else {
            warn!(
                "node '{node_id}' references unknown light '{}', skipping",
                light_ref.light
            );
            return;
        };
        let attached = if self.capabilities.instanced_lights {
            Rc::clone(light)
        } else {
            Rc::new(RefCell::new(light.borrow().clone()))
        };
        let mut node = SceneNode::new(light_ref.light.clone());
        node.attachment = Attachment::Light(attached);
        parent.borrow_mut().children.push(node.into_handle());
    }

    fn attach_collision(&mut self, parent: &NodeHandle, node_id: &str, physics: &RigidBody) {
        let mut shapes = Vec::new();
        for shape in &physics.collision_shapes {
            match self.collision_shape(node_id, shape) {
                Some(built) => shapes.push(built),
                None => continue,
            }
        }
        let body = CollisionBody {
            name: format!("{node_id}-physics"),
            shapes,
            mass: physics.mass,
            is_static: physics.is_static,
        };
        let mut node = SceneNode::new(body.name.clone());
        node.attachment = Attachment::Collision(body);
        parent.borrow_mut().children.push(node.into_handle());
    }

    fn collision_shape(&self, node_id: &str, def: &CollisionShapeDef) -> Option<CollisionShape> {
        let [x, y, z] = def.bounding_box;
        let radius = x.max(y) / 2.0;
        match def.shape_type {
            CollisionShapeType::Box => Some(CollisionShape::Box {
                half_extents: [x / 2.0, y / 2.0, z / 2.0],
            }),
            CollisionShapeType::Sphere => Some(CollisionShape::Sphere {
                radius: x.max(y).max(z) / 2.0,
            }),
            CollisionShapeType::Capsule => Some(CollisionShape::Capsule {
                radius,
                height: (z - 2.0 * radius).max(0.0),
            }),
            CollisionShapeType::Cylinder => Some(CollisionShape::Cylinder { radius, height: z }),
            CollisionShapeType::Cone => Some(CollisionShape::Cone { radius, height: z }),
            CollisionShapeType::ConvexHull | CollisionShapeType::Mesh => {
                let Some(mesh_id) = &def.mesh else {
                    warn!("collision shape on node '{node_id}' names no mesh, skipping");
                    return None;
                };
                let Some(mesh) = self.meshes.get(mesh_id) else {
                    warn!(
                        "collision shape on node '{node_id}' references unknown mesh '{mesh_id}', skipping"
                    );
                    return None;
                };
                let mesh = Rc::clone(mesh);
                Some(match def.shape_type {
                    CollisionShapeType::ConvexHull => CollisionShape::ConvexHull { mesh },
                    _ => CollisionShape::TriangleMesh { mesh },
                })
            }
            CollisionShapeType::Unknown => {
                warn!("collision shape on node '{node_id}' has an unsupported type, skipping");
                None
            }
        }
    }
}

fn an_odd_number_of_negative_components(scale: [f32; 3]) -> bool {
    scale.iter().filter(|component| **component < 0.0).count() % 2 == 1
}

fn set_visible_recursive(handle: &NodeHandle, visible: bool) {
    let mut node = handle.borrow_mut();
    node.visible = visible;
    for child in &node.children {
        set_visible_recursive(child, visible);
    }
}
