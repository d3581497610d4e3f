// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! A registered object and the illumination it receives.

use crate::illumination::ObjectIllumination;
use radia_core::SceneObject;

/// One entry of the scheduler's object list. Its position in that list is the
/// object's provenance id.
pub struct RegisteredObject {
    object: Box<dyn SceneObject>,
    illumination: ObjectIllumination,
}

impl RegisteredObject {
    /// Registers `object` with empty illumination storage.
    pub fn new(object: Box<dyn SceneObject>) -> Self {
        Self::with_illumination(object, ObjectIllumination::new())
    }

    /// Registers `object` with existing storage, e.g. kept from a previous
    /// registration so the renderer's buffers survive.
    pub fn with_illumination(object: Box<dyn SceneObject>, illumination: ObjectIllumination) -> Self {
        Self {
            object,
            illumination,
        }
    }

    /// The geometry and material provider.
    pub fn object(&self) -> &dyn SceneObject {
        self.object.as_ref()
    }

    /// Mutable access to the provider.
    pub fn object_mut(&mut self) -> &mut dyn SceneObject {
        self.object.as_mut()
    }

    /// The illumination buffers.
    pub fn illumination(&self) -> &ObjectIllumination {
        &self.illumination
    }

    /// Mutable access to the illumination buffers.
    pub fn illumination_mut(&mut self) -> &mut ObjectIllumination {
        &mut self.illumination
    }

    /// Borrows the provider and the buffers at the same time.
    pub fn parts_mut(&mut self) -> (&dyn SceneObject, &mut ObjectIllumination) {
        (self.object.as_ref(), &mut self.illumination)
    }

    /// Splits the entry back into its parts.
    pub fn into_parts(self) -> (Box<dyn SceneObject>, ObjectIllumination) {
        (self.object, self.illumination)
    }
}

impl std::fmt::Debug for RegisteredObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredObject")
            .field("vertices", &self.object.vertex_count())
            .field("triangles", &self.object.triangle_count())
            .field("illumination", &self.illumination)
            .finish()
    }
}
